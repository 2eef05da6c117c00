//! Live SMS updates over server-sent events. Each subscriber gets its own
//! broadcast receiver; a slow consumer that lags simply misses the dropped
//! events and picks up from the next one.

use actix_web::{get, web, Responder};
use actix_web_lab::sse;
use futures_util::StreamExt;
use log::info;
use std::convert::Infallible;
use std::time::Duration;
use tokio_stream::wrappers::BroadcastStream;

use crate::api::handlers::AppState;
use crate::store::StoreEvent;

const KEEP_ALIVE: Duration = Duration::from_secs(5);

#[get("/sms/events")]
pub async fn sms_events(state: web::Data<AppState>) -> impl Responder {
    info!("SSE subscriber attached to SMS events");
    let receiver = state.store.subscribe();

    let stream = BroadcastStream::new(receiver).filter_map(|item| async move {
        match item {
            Ok(event) => Some(Ok::<_, Infallible>(sse::Event::Data(data_for(&event)?))),
            // Lagged receivers skip ahead rather than terminating the stream.
            Err(_) => None,
        }
    });

    sse::Sse::from_stream(stream).with_keep_alive(KEEP_ALIVE)
}

fn data_for(event: &StoreEvent) -> Option<sse::Data> {
    sse::Data::new_json(event).ok()
}
