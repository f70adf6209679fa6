use std::sync::Arc;
use std::time::Instant;

use crate::bot::QueueBot;
use crate::config::Settings;
use crate::postgres::PostgresPool;
use crate::queue::QueueService;

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub bot: Arc<QueueBot>,
    pub queue_service: Arc<QueueService>,
    pub postgres_pool: Option<PostgresPool>,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(settings: Settings, bot: QueueBot, postgres_pool: Option<PostgresPool>) -> Self {
        let queue_service = bot.queue_service().clone();

        Self {
            settings: Arc::new(settings),
            bot: Arc::new(bot),
            queue_service,
            postgres_pool,
            start_time: Instant::now(),
        }
    }
}
