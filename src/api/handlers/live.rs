//! Live guest-list session over a WebSocket.
//!
//! On connect the organizer receives a `snapshot` frame with the guest rows,
//! the current selection and the event statistics. Every RSVP change on the
//! event then arrives as a `change` frame carrying the updated statistics.
//! Commands (`set_status`, `toggle_select`, `select_all`, `clear_selection`,
//! `send_message`, `refresh`) are JSON objects tagged by `type`.

use axum::{
    extract::{ws::{Message, WebSocket}, Path, State, WebSocketUpgrade},
    response::Response,
};
use crate::state::AppState;
use crate::api::extractors::auth::AuthUser;
use crate::api::dtos::{requests::LiveCommand, responses::LiveMessage};
use crate::api::handlers::{event::load_owned_event, guest::{send_bulk, summarize}};
use crate::domain::models::{auth::SessionUser, event::Event, rsvp::Rsvp};
use crate::domain::services::{guest_list::GuestListStore, notification_service::Draft};
use crate::error::AppError;
use std::sync::Arc;
use tracing::{debug, info, info_span, warn, Instrument};

pub async fn live_guest_list(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(event_id): Path<String>,
) -> Result<Response, AppError> {
    let event = load_owned_event(&state, &event_id, &user).await?;
    info!(event_id = %event.id, "Live guest list requested");

    let span = info_span!("live_session", event_id = %event.id, user_id = %user.id);
    Ok(ws.on_upgrade(move |socket| run_session(socket, state, event, user).instrument(span)))
}

async fn run_session(mut socket: WebSocket, state: Arc<AppState>, event: Event, user: SessionUser) {
    // subscribe first so nothing written while the snapshot loads is missed
    let mut changes = state.feed.subscribe(&event.id);

    let mut store = match load_store(&state, &event).await {
        Ok(store) => store,
        Err(e) => {
            warn!("Failed to load guest list: {}", e);
            let _ = send(&mut socket, &LiveMessage::Error { message: e.public_message() }).await;
            return;
        }
    };
    if send_snapshot(&mut socket, &state, &store).await.is_err() {
        return;
    }
    info!(subscribers = state.feed.subscriber_count(&event.id), "Live session started");

    loop {
        tokio::select! {
            incoming = socket.recv() => match incoming {
                Some(Ok(Message::Text(text))) => {
                    let replies = match serde_json::from_str::<LiveCommand>(text.as_str()) {
                        Ok(command) => handle_command(&state, &event, &user, &mut store, command).await,
                        Err(e) => vec![LiveMessage::Error { message: format!("Unrecognized command: {}", e) }],
                    };
                    let mut closed = false;
                    for reply in &replies {
                        if send(&mut socket, reply).await.is_err() {
                            closed = true;
                            break;
                        }
                    }
                    if closed {
                        break;
                    }
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    debug!("WebSocket receive error: {}", e);
                    break;
                }
            },
            change = changes.recv() => match change {
                Some(change) => {
                    store.apply_remote(&change);
                    let frame = LiveMessage::Change { stats: state.stats.cached(&event.id), change };
                    if send(&mut socket, &frame).await.is_err() {
                        break;
                    }
                }
                None => break,
            },
        }
    }

    info!("Live session ended");
}

async fn load_store(state: &AppState, event: &Event) -> Result<GuestListStore, AppError> {
    let rows = state.rsvp_service.list(&event.id).await?;
    Ok(GuestListStore::new(event.id.clone(), rows))
}

async fn send_snapshot(socket: &mut WebSocket, state: &AppState, store: &GuestListStore) -> Result<(), axum::Error> {
    let stats = match state.stats.get(store.event_id()).await {
        Ok(stats) => stats,
        Err(e) => {
            return send(socket, &LiveMessage::Error { message: e.public_message() }).await;
        }
    };

    send(socket, &LiveMessage::Snapshot {
        guests: store.rows().to_vec(),
        selected: store.selected_ids(),
        stats,
    }).await
}

/// Applies one session command to the organizer's store and returns the frames to send back.
pub async fn handle_command(
    state: &AppState,
    event: &Event,
    user: &SessionUser,
    store: &mut GuestListStore,
    command: LiveCommand,
) -> Vec<LiveMessage> {
    match command {
        LiveCommand::SetStatus { rsvp_id, status } => {
            if let Err(e) = store.begin_status_change(&rsvp_id, status) {
                return vec![LiveMessage::StatusResult {
                    ok: false,
                    error: Some(e.to_string()),
                    guest: store.get(&rsvp_id).cloned(),
                    rsvp_id,
                }];
            }

            let outcome = state.rsvp_service.update_status(event, &rsvp_id, status, Some(&user.id)).await;
            let error = store.reconcile(&rsvp_id, outcome).err().map(|e| {
                warn!(rsvp_id = %rsvp_id, "Status change rolled back: {}", e);
                e.public_message()
            });

            vec![LiveMessage::StatusResult {
                ok: error.is_none(),
                error,
                guest: store.get(&rsvp_id).cloned(),
                rsvp_id,
            }]
        }
        LiveCommand::ToggleSelect { rsvp_id } => match store.toggle_select(&rsvp_id) {
            Ok(_) => vec![LiveMessage::Selection { selected: store.selected_ids() }],
            Err(e) => vec![LiveMessage::Error { message: e.to_string() }],
        },
        LiveCommand::SelectAll => {
            store.select_all();
            vec![LiveMessage::Selection { selected: store.selected_ids() }]
        }
        LiveCommand::ClearSelection => {
            store.clear_selection();
            vec![LiveMessage::Selection { selected: store.selected_ids() }]
        }
        LiveCommand::SendMessage { channels, subject, body } => {
            let recipients: Vec<Rsvp> = store.selected().into_iter().cloned().collect();
            let draft = Draft { subject, body };
            match send_bulk(&state.notification_service, event, &recipients, &channels, &draft).await {
                Ok(records) => {
                    let summary = summarize(records);
                    vec![LiveMessage::MessageResult {
                        sent: summary.sent,
                        failed: summary.failed,
                        skipped: summary.skipped,
                    }]
                }
                Err(e) => vec![LiveMessage::Error { message: e.public_message() }],
            }
        }
        LiveCommand::Refresh => match load_store(state, event).await {
            Ok(fresh) => {
                let selected = store.selected_ids();
                *store = fresh;
                for id in &selected {
                    let _ = store.toggle_select(id);
                }
                let stats = state.stats.get(&event.id).await;
                match stats {
                    Ok(stats) => vec![LiveMessage::Snapshot {
                        guests: store.rows().to_vec(),
                        selected: store.selected_ids(),
                        stats,
                    }],
                    Err(e) => vec![LiveMessage::Error { message: e.public_message() }],
                }
            }
            Err(e) => vec![LiveMessage::Error { message: e.public_message() }],
        },
    }
}

async fn send(socket: &mut WebSocket, message: &LiveMessage) -> Result<(), axum::Error> {
    let payload = match serde_json::to_string(message) {
        Ok(payload) => payload,
        Err(e) => {
            warn!("Failed to encode live frame: {}", e);
            return Ok(());
        }
    };
    socket.send(Message::Text(payload.into())).await
}
