//! Logging and OpenTelemetry tracing
//!
//! Log lines are written to stdout as JSON or compact text. When the
//! `observability` feature is enabled and `otlp.enabled` is set, spans are
//! also exported over OTLP/gRPC. Keep the returned [`TracingGuard`] alive for
//! the lifetime of the process; dropping it flushes pending spans.

use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry,
};

use crate::{
    config::{Config, LogFormat},
    error::{Error, Result},
};

#[cfg(feature = "observability")]
use opentelemetry::{global, trace::TracerProvider as _, KeyValue};
#[cfg(feature = "observability")]
use opentelemetry_otlp::WithExportConfig;
#[cfg(feature = "observability")]
use opentelemetry_sdk::{
    propagation::TraceContextPropagator,
    trace::{RandomIdGenerator, Sampler, SdkTracerProvider},
    Resource,
};

#[cfg(feature = "observability")]
use crate::config::TraceExporter;

const NOISY_TARGETS: &str = "h2=warn,hyper=warn,tower=warn,tonic=warn,opentelemetry=warn,sqlx=warn";

/// Flushes the span exporter when dropped
#[must_use = "dropping the guard shuts the span exporter down"]
pub struct TracingGuard {
    #[cfg(feature = "observability")]
    provider: Option<SdkTracerProvider>,
}

impl TracingGuard {
    /// Whether spans are being exported
    #[cfg(feature = "observability")]
    pub fn is_exporting(&self) -> bool {
        self.provider.is_some()
    }

    #[cfg(not(feature = "observability"))]
    pub fn is_exporting(&self) -> bool {
        false
    }
}

#[cfg(feature = "observability")]
impl Drop for TracingGuard {
    fn drop(&mut self) {
        if let Some(provider) = self.provider.take() {
            if let Err(e) = provider.shutdown() {
                eprintln!("failed to shut down tracer provider: {e}");
            }
        }
    }
}

/// Install the global subscriber
///
/// `RUST_LOG` wins over `service.log_level` when set.
pub fn init_tracing(config: &Config) -> Result<TracingGuard> {
    let guard = match config.service.log_format {
        LogFormat::Json => install(config, json_layer())?,
        LogFormat::Compact => install(config, compact_layer())?,
    };

    tracing::info!(
        service = %config.service.name,
        environment = %config.service.environment,
        exporting = guard.is_exporting(),
        "tracing initialized"
    );

    Ok(guard)
}

fn json_layer<S>() -> impl Layer<S> + Send + Sync + 'static
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_target(true)
}

fn compact_layer<S>() -> impl Layer<S> + Send + Sync + 'static
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    fmt::layer()
        .compact()
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
}

fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(format!("{level},{NOISY_TARGETS}")))
        .unwrap_or_else(|_| EnvFilter::new(format!("info,{NOISY_TARGETS}")))
}

#[cfg(feature = "observability")]
fn install<L>(config: &Config, fmt_layer: L) -> Result<TracingGuard>
where
    L: Layer<Registry> + Send + Sync + 'static,
{
    let provider = build_tracer_provider(config)?;
    let otel_layer = provider.as_ref().map(|provider| {
        tracing_opentelemetry::layer().with_tracer(provider.tracer(config.trace_service_name().to_string()))
    });

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(env_filter(&config.service.log_level))
        .with(otel_layer)
        .try_init()
        .map_err(|e| Error::Tracing(e.to_string()))?;

    Ok(TracingGuard { provider })
}

#[cfg(not(feature = "observability"))]
fn install<L>(config: &Config, fmt_layer: L) -> Result<TracingGuard>
where
    L: Layer<Registry> + Send + Sync + 'static,
{
    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(env_filter(&config.service.log_level))
        .try_init()
        .map_err(|e| Error::Tracing(e.to_string()))?;

    Ok(TracingGuard {})
}

#[cfg(feature = "observability")]
fn build_tracer_provider(config: &Config) -> Result<Option<SdkTracerProvider>> {
    let otlp = &config.otlp;
    if !otlp.enabled || otlp.exporter == TraceExporter::Stdout {
        return Ok(None);
    }

    global::set_text_map_propagator(TraceContextPropagator::new());

    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(otlp.endpoint.clone())
        .with_timeout(std::time::Duration::from_secs(otlp.timeout_secs))
        .build()
        .map_err(|e| Error::Tracing(format!("failed to build OTLP exporter: {e}")))?;

    let resource = Resource::builder_empty()
        .with_service_name(config.trace_service_name().to_string())
        .with_attributes([
            KeyValue::new("service.version", env!("CARGO_PKG_VERSION")),
            KeyValue::new(
                "deployment.environment.name",
                config.service.environment.clone(),
            ),
        ])
        .build();

    let provider = SdkTracerProvider::builder()
        .with_sampler(Sampler::ParentBased(Box::new(Sampler::TraceIdRatioBased(
            otlp.sample_ratio.clamp(0.0, 1.0),
        ))))
        .with_id_generator(RandomIdGenerator::default())
        .with_resource(resource)
        .with_batch_exporter(exporter)
        .build();

    global::set_tracer_provider(provider.clone());

    Ok(Some(provider))
}
