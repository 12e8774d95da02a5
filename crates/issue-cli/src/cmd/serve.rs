use crate::root::Workspace;
use issue_server::state::AppState;

pub fn run(ws: &Workspace, port: u16, no_open: bool) -> anyhow::Result<()> {
    if !ws.board.exists() {
        tracing::warn!(
            path = %ws.board.path().display(),
            "board file does not exist yet; run 'issue init' or PUT /api/board"
        );
    }
    let web_dist = ws.web_dist();
    if let Some(dist) = web_dist.as_deref().filter(|d| !d.is_dir()) {
        tracing::warn!(path = %dist.display(), "web_dist is not a directory; serving the API only");
    }

    println!("Kanban board → http://localhost:{port}  (Ctrl+C to stop)");

    let board = ws.board.clone();
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async move {
        // Built inside the runtime so the board watcher starts.
        let state = AppState::new(board, web_dist);
        issue_server::serve(state, port, !no_open).await
    })
}
