//! HMR protocol tests over a real WebSocket.

use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tails_server::modules::{ModuleCache, ModuleRecord};
use tokio::net::TcpStream;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};

mod common;

use common::{app_root, builder, server, spawn_server, MemoryProject};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn start() -> (tempfile::TempDir, Arc<ModuleCache>, Socket, tails_server::Shutdown) {
    let root = app_root(&[]);
    let project = MemoryProject::new().module("/pages/index.js", "export default 1");
    let modules = Arc::clone(&project.modules);
    let (addr, shutdown) = spawn_server(server(builder(root.path()).build(), Arc::new(project))).await;

    let (socket, _) = connect_async(format!("ws://{}/_hmr", addr)).await.unwrap();
    (root, modules, socket, shutdown)
}

async fn send_text(socket: &mut Socket, text: &str) {
    socket.send(Message::Text(text.into())).await.unwrap();
}

/// Next JSON message, or `None` if nothing arrives within `wait`.
async fn next_json(socket: &mut Socket, wait: Duration) -> Option<Value> {
    loop {
        let frame = tokio::time::timeout(wait, socket.next()).await.ok()??;
        match frame.unwrap() {
            Message::Text(text) => return Some(serde_json::from_str(text.as_str()).unwrap()),
            Message::Close(_) => return None,
            _ => continue,
        }
    }
}

async fn settle() {
    tokio::time::sleep(Duration::from_millis(100)).await;
}

const WAIT: Duration = Duration::from_millis(500);
const QUIET: Duration = Duration::from_millis(250);

#[tokio::test]
async fn test_double_hot_accept_yields_one_update() {
    let (_root, modules, mut socket, _shutdown) = start().await;

    let accept = r#"{"type":"hotAccept","id":"/pages/index.js"}"#;
    send_text(&mut socket, accept).await;
    send_text(&mut socket, accept).await;
    settle().await;

    let event = modules.publish(ModuleRecord::new("/pages/index.js", "export default 2", ""));
    assert!(event.is_some());
    let hash = modules.get_by_id("/pages/index.js").unwrap().hash.clone();

    let update = next_json(&mut socket, WAIT).await.unwrap();
    assert_eq!(
        update,
        json!({
            "type": "update",
            "moduleId": "/pages/index.js",
            "hash": hash,
            "updateUrl": format!("/_aleph/pages/index.{}.js", &hash[..8]),
        })
    );
    assert_eq!(next_json(&mut socket, QUIET).await, None);
}

#[tokio::test]
async fn test_no_update_after_remove() {
    let (_root, modules, mut socket, _shutdown) = start().await;

    send_text(&mut socket, r#"{"type":"hotAccept","id":"/pages/index.js"}"#).await;
    settle().await;

    assert!(modules.remove("/pages/index.js"));
    let removed = next_json(&mut socket, WAIT).await.unwrap();
    assert_eq!(removed, json!({"type": "remove", "moduleId": "/pages/index.js"}));

    // the module comes back: clients hear about it, but the old subscription is gone
    modules.publish(ModuleRecord::new("/pages/index.js", "export default 3", ""));
    let added = next_json(&mut socket, WAIT).await.unwrap();
    assert_eq!(added["type"], "add");

    modules.publish(ModuleRecord::new("/pages/index.js", "export default 4", ""));
    assert_eq!(next_json(&mut socket, QUIET).await, None);
}

#[tokio::test]
async fn test_unsubscribed_modules_get_no_update() {
    let (_root, modules, mut socket, _shutdown) = start().await;

    modules.publish(ModuleRecord::new("/pages/index.js", "export default 2", ""));
    assert_eq!(next_json(&mut socket, QUIET).await, None);
}

#[tokio::test]
async fn test_add_is_announced() {
    let (_root, modules, mut socket, _shutdown) = start().await;
    settle().await;

    modules.publish(ModuleRecord::new("/components/nav.js", "export {}", ""));
    let hash = modules.get_by_id("/components/nav.js").unwrap().hash.clone();
    let added = next_json(&mut socket, WAIT).await.unwrap();
    assert_eq!(added, json!({"type": "add", "moduleId": "/components/nav.js", "hash": hash}));
}

#[tokio::test]
async fn test_malformed_frames_do_not_close_session() {
    let (_root, modules, mut socket, _shutdown) = start().await;

    send_text(&mut socket, "not json").await;
    send_text(&mut socket, r#"{"id":"/pages/index.js"}"#).await;
    send_text(&mut socket, r#"{"type":"hotAccept","id":""}"#).await;
    socket.send(Message::Binary(vec![1u8, 2, 3].into())).await.unwrap();
    send_text(&mut socket, r#"{"type":"hotAccept","id":"/pages/index.js"}"#).await;
    settle().await;

    modules.publish(ModuleRecord::new("/pages/index.js", "export default 5", ""));
    let update = next_json(&mut socket, WAIT).await.unwrap();
    assert_eq!(update["type"], "update");
}

#[tokio::test]
async fn test_shutdown_closes_sessions() {
    let (_root, _modules, mut socket, shutdown) = start().await;
    settle().await;

    shutdown.trigger();
    let closed = tokio::time::timeout(WAIT, async {
        loop {
            match socket.next().await {
                Some(Ok(Message::Close(_))) | None | Some(Err(_)) => return true,
                Some(Ok(_)) => continue,
            }
        }
    })
    .await;
    assert!(matches!(closed, Ok(true)));
}

#[tokio::test]
async fn test_lagging_session_is_closed() {
    let (_root, modules, mut socket, _shutdown) = start().await;
    settle().await;

    // no await in between, so the session task cannot drain the channel
    for i in 0..300 {
        modules.publish(ModuleRecord::new(format!("/lib/m{}.js", i), "export default 0", ""));
    }

    let closed = tokio::time::timeout(WAIT, async {
        while let Some(frame) = socket.next().await {
            match frame {
                Ok(Message::Close(_)) | Err(_) => return true,
                Ok(_) => continue,
            }
        }
        true
    })
    .await;
    assert!(matches!(closed, Ok(true)));
}

