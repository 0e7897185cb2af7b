use std::sync::Arc;

use tower_http::cors::CorsLayer;

use onboarding_wizard::celebrate::LogCelebration;
use onboarding_wizard::config::WizardConfig;
use onboarding_wizard::rotator::{self, display_routes, spawn_rotation};
use onboarding_wizard::wizard::routes::{WizardRouteState, wizard_routes};
use onboarding_wizard::wizard::WizardController;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let port: u16 = std::env::var("ONBOARDING_PORT")
        .unwrap_or_else(|_| "8080".to_string())
        .parse()
        .unwrap_or(8080);

    // Optional JSON wizard definition; the built-in flow otherwise.
    let mut config = match std::env::var("ONBOARDING_CONFIG") {
        Ok(path) => WizardConfig::load_json(&path).unwrap_or_else(|e| {
            eprintln!("Error: Failed to load wizard config from {}: {}", path, e);
            std::process::exit(1);
        }),
        Err(_) => WizardConfig::default(),
    };
    if let Ok(url) = std::env::var("ONBOARDING_COMMUNITY_URL") {
        config.community_url = url;
    }

    eprintln!("🧭 Onboarding Wizard v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Steps: {}", config.step_count());
    eprintln!("   Community: {}", config.community_url);
    eprintln!("   API: http://0.0.0.0:{}/api/wizard/status", port);
    eprintln!("   Progress WS: ws://0.0.0.0:{}/ws/progress\n", port);

    let controller = WizardController::new(config, Arc::new(LogCelebration)).unwrap_or_else(|e| {
        eprintln!("Error: Invalid wizard configuration: {}", e);
        std::process::exit(1);
    });

    // Decorative fact rotation; independent of navigation, aborted on exit.
    let (fact_rx, rotation_handle) =
        spawn_rotation(rotator::default_entries(), rotator::DEFAULT_PERIOD);

    let app = wizard_routes(WizardRouteState {
        controller: Arc::clone(&controller),
    })
    .merge(display_routes(fact_rx))
    .layer(CorsLayer::permissive());

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;
    tracing::info!(port, "Wizard server started");
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    // Session over: cancel timers so nothing outlives it.
    rotation_handle.abort();
    controller.teardown().await;

    Ok(())
}
