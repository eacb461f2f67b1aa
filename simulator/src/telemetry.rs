//! Log and trace setup.
//!
//! Logs always go to stderr through a `tracing-subscriber` fmt layer filtered by
//! `RUST_LOG` (default `info`), leaving stdout to the report. With the `telemetry`
//! feature, spans are also exported over OTLP when any `OTEL_EXPORTER_OTLP_*`
//! variable is set.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[cfg(feature = "telemetry")]
mod otlp {
    use opentelemetry::KeyValue;
    use opentelemetry_otlp::ExporterBuildError;
    use opentelemetry_sdk::Resource;
    use opentelemetry_sdk::trace::{RandomIdGenerator, Sampler, SdkTracerProvider};
    use opentelemetry_semantic_conventions::SCHEMA_URL;
    use opentelemetry_semantic_conventions::attribute::{
        DEPLOYMENT_ENVIRONMENT_NAME, SERVICE_VERSION,
    };
    use std::env;

    /// Telemetry protocol to use for OTLP export
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum TelemetryProtocol {
        Http,
        Grpc,
    }

    impl TelemetryProtocol {
        /// Determines the protocol from environment variables if OTLP is configured
        pub fn from_env() -> Option<Self> {
            let is_enabled = env::var("OTEL_EXPORTER_OTLP_ENDPOINT").is_ok()
                || env::var("OTEL_EXPORTER_OTLP_HEADERS").is_ok()
                || env::var("OTEL_EXPORTER_OTLP_PROTOCOL").is_ok();
            if !is_enabled {
                return None;
            }
            let protocol = match env::var("OTEL_EXPORTER_OTLP_PROTOCOL").as_deref() {
                Ok("grpc") => TelemetryProtocol::Grpc,
                _ => TelemetryProtocol::Http,
            };
            Some(protocol)
        }
    }

    fn resource() -> Resource {
        let deployment_env = env::var("DEPLOYMENT_ENV").unwrap_or_else(|_| "develop".to_string());
        Resource::builder()
            .with_service_name(env!("CARGO_PKG_NAME"))
            .with_schema_url(
                [
                    KeyValue::new(SERVICE_VERSION, env!("CARGO_PKG_VERSION")),
                    KeyValue::new(DEPLOYMENT_ENVIRONMENT_NAME, deployment_env),
                ],
                SCHEMA_URL,
            )
            .build()
    }

    pub fn tracer_provider(
        protocol: TelemetryProtocol,
    ) -> Result<SdkTracerProvider, ExporterBuildError> {
        let exporter = opentelemetry_otlp::SpanExporter::builder();
        let exporter = match protocol {
            TelemetryProtocol::Http => exporter.with_http().build()?,
            TelemetryProtocol::Grpc => exporter.with_tonic().build()?,
        };
        Ok(SdkTracerProvider::builder()
            .with_sampler(Sampler::ParentBased(Box::new(Sampler::AlwaysOn)))
            .with_id_generator(RandomIdGenerator::default())
            .with_resource(resource())
            .with_batch_exporter(exporter)
            .build())
    }
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Installed subscriber. Flushes exported spans on drop.
pub struct Telemetry {
    #[cfg(feature = "telemetry")]
    tracer_provider: Option<opentelemetry_sdk::trace::SdkTracerProvider>,
}

impl Telemetry {
    #[cfg(feature = "telemetry")]
    pub fn init() -> Result<Self, opentelemetry_otlp::ExporterBuildError> {
        use opentelemetry::trace::TracerProvider as _;
        use tracing_opentelemetry::OpenTelemetryLayer;

        let fmt = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);
        match otlp::TelemetryProtocol::from_env() {
            Some(protocol) => {
                let tracer_provider = otlp::tracer_provider(protocol)?;
                let tracer = tracer_provider.tracer(env!("CARGO_PKG_NAME"));
                tracing_subscriber::registry()
                    .with(env_filter())
                    .with(fmt)
                    .with(OpenTelemetryLayer::new(tracer))
                    .init();
                tracing::info!(?protocol, "OpenTelemetry span export is enabled");
                Ok(Self {
                    tracer_provider: Some(tracer_provider),
                })
            }
            None => {
                tracing_subscriber::registry()
                    .with(env_filter())
                    .with(fmt)
                    .init();
                Ok(Self {
                    tracer_provider: None,
                })
            }
        }
    }

    #[cfg(not(feature = "telemetry"))]
    pub fn init() -> Result<Self, std::convert::Infallible> {
        tracing_subscriber::registry()
            .with(env_filter())
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
        Ok(Self {})
    }
}

#[cfg(feature = "telemetry")]
impl Drop for Telemetry {
    fn drop(&mut self) {
        if let Some(tracer_provider) = self.tracer_provider.as_ref() {
            if let Err(err) = tracer_provider.shutdown() {
                eprintln!("{err:?}");
            }
        }
    }
}
