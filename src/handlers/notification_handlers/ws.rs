use actix_web::{HttpRequest, HttpResponse, web};
use actix_ws::Message;

use crate::auth::AuthContext;
use crate::notifications::queries;
use crate::state::AppState;

/// WebSocket upgrade for the live notification feed.
///
/// The server only pushes; the client acts through the HTTP endpoints. The
/// current unread count is sent right after the upgrade.
pub async fn ws_connect(
    req: HttpRequest,
    body: web::Payload,
    ctx: AuthContext,
    state: web::Data<AppState>,
) -> Result<HttpResponse, actix_web::Error> {
    let user_id = ctx.user_id();
    let (response, mut ws_session, mut msg_stream) = actix_ws::handle(&req, body)?;

    let mut rx = state.hub.subscribe(user_id);
    let hub = state.hub.clone();
    let unread = queries::count_unread(&state.pool, user_id).await.unwrap_or(0);

    actix_web::rt::spawn(async move {
        let hello = serde_json::json!({ "type": "count_update", "unread_count": unread });
        if ws_session.text(hello.to_string()).await.is_ok() {
            loop {
                tokio::select! {
                    Some(msg) = rx.recv() => {
                        if ws_session.text(msg).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(msg)) = msg_stream.recv() => {
                        match msg {
                            Message::Ping(bytes) => {
                                if ws_session.pong(&bytes).await.is_err() {
                                    break;
                                }
                            }
                            Message::Close(_) => break,
                            _ => {}
                        }
                    }
                    else => break,
                }
            }
        }

        // Clean up on disconnect
        drop(rx);
        hub.prune(user_id);
        log::debug!("Notification feed closed for user {user_id}");
    });

    Ok(response)
}
