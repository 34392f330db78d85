use std::{future::Future, pin::Pin, sync::Arc};

use crate::events::{EventHandler, EventProducer, Handler, OrderFinalizedEvent};

#[derive(Default, Clone)]
pub struct EventProducers {
    pub order_finalized_producer: Vec<EventProducer<OrderFinalizedEvent>>,
}

pub struct EventHandlers {
    pub on_order_finalized: Option<EventHandler<OrderFinalizedEvent>>,
}

impl EventHandlers {
    pub fn new(buffer_size: usize, hooks: EventHooks) -> Self {
        let on_order_finalized = hooks.on_order_finalized.map(|f| EventHandler::new(buffer_size, f));
        Self { on_order_finalized }
    }

    pub fn producers(&self) -> EventProducers {
        let mut result = EventProducers::default();
        if let Some(handler) = &self.on_order_finalized {
            result.order_finalized_producer.push(handler.subscribe());
        }
        result
    }

    pub async fn start_handlers(self) {
        if let Some(handler) = self.on_order_finalized {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
    }
}

#[derive(Default, Clone)]
pub struct EventHooks {
    pub on_order_finalized: Option<Handler<OrderFinalizedEvent>>,
}

impl EventHooks {
    pub fn on_order_finalized<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(OrderFinalizedEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_order_finalized = Some(Arc::new(f));
        self
    }
}
