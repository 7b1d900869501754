use super::{respond, HandlerResult};

pub async fn health() -> HandlerResult<()> {
    respond((), "Rivalry tracker API is running")
}
