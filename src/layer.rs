use tracing::span::{Attributes, Id};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::Layer;
use tracing_subscriber::layer::Context;
use tracing_subscriber::registry::LookupSpan;

use crate::{MultiProgress, ProgressInstance};

/// A `tracing` [`Layer`] that shows every span as a spinner line.
///
/// Each new span becomes a [`ProgressInstance`] labelled with its `message`
/// field (or the span name) and is added to the container. The instance stops
/// when the span closes: with success, unless an `ERROR` event was recorded
/// inside the span.
///
/// ```rust,ignore
/// let multi = MultiProgress::new();
/// tracing_subscriber::registry().with(ProgressLayer::new(multi.clone())).init();
/// multi.start();
///
/// async { /* ... */ }.instrument(info_span!("compile", message = "my-project")).await;
///
/// multi.stop().await?;
/// ```
pub struct ProgressLayer {
    multi: MultiProgress,
}

impl ProgressLayer {
    pub fn new(multi: MultiProgress) -> Self {
        Self { multi }
    }
}

struct Tracked {
    instance: ProgressInstance,
    failed: bool,
}

impl<S> Layer<S> for ProgressLayer
where S: Subscriber + for<'a> LookupSpan<'a>
{
    fn on_new_span(&self, attrs: &Attributes<'_>, id: &Id, ctx: Context<'_, S>) {
        let mut message = String::new();
        attrs.record(&mut MessageVisitor(&mut message));
        if message.is_empty() {
            message = attrs.metadata().name().to_string();
        }

        let instance = ProgressInstance::new(message);
        if let Some(span) = ctx.span(id) {
            span.extensions_mut().insert(Tracked {
                instance: instance.clone(),
                failed: false,
            });
        }
        self.multi.add_progress(instance);
    }

    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        if *event.metadata().level() != Level::ERROR {
            return;
        }
        if let Some(span) = ctx.event_span(event)
            && let Some(tracked) = span.extensions_mut().get_mut::<Tracked>()
        {
            tracked.failed = true;
        }
    }

    fn on_close(&self, id: Id, ctx: Context<'_, S>) {
        let tracked = ctx.span(&id).and_then(|span| span.extensions_mut().remove::<Tracked>());
        if let Some(tracked) = tracked {
            tracked.instance.stop(!tracked.failed, None);
        }
    }
}

struct MessageVisitor<'a>(&'a mut String);

impl tracing::field::Visit for MessageVisitor<'_> {
    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == "message" {
            *self.0 = value.to_string();
        }
    }

    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            *self.0 = format!("{:?}", value);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use tracing_subscriber::layer::SubscriberExt;

    use super::*;
    use crate::format::NoColor;
    use crate::frames;

    #[test]
    fn spans_become_instances_that_stop_on_close() {
        let frames = Arc::new(Mutex::new(Vec::<String>::new()));
        let seen = frames.clone();
        let multi = MultiProgress::with_sink(move |block: &str| -> std::io::Result<()> {
            seen.lock().unwrap().push(block.to_string());
            Ok(())
        })
        .colors(NoColor);

        let subscriber = tracing_subscriber::registry().with(ProgressLayer::new(multi.clone()));
        tracing::subscriber::with_default(subscriber, || {
            let compile = tracing::info_span!("compile", message = "my-project");
            compile.in_scope(|| tracing::info!("type checking"));
            let deploy = tracing::info_span!("deploy");
            deploy.in_scope(|| tracing::error!("health check failed"));

            multi.render().unwrap();
            let running = format!("my-project {}\ndeploy {}", frames::DOTS7[0], frames::DOTS7[0]);
            assert_eq!(frames.lock().unwrap().last().unwrap(), &running);

            drop(compile);
            drop(deploy);
            multi.render().unwrap();
        });

        assert_eq!(multi.len(), 2);
        assert_eq!(
            frames.lock().unwrap().last().unwrap(),
            "my-project: OK\ndeploy: ERROR"
        );
    }
}
