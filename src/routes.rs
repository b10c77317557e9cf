use crate::{
    api::{absence, attendance, device, office, schedule},
    auth::middleware::auth_middleware,
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{HttpResponse, middleware::from_fn, web};
use anyhow::{Result, anyhow};
use std::sync::Arc;

type Limiter = Arc<Governor<PeerIpKeyExtractor, NoOpMiddleware>>;

/// Per-IP rate limiters, built once and shared by every worker.
#[derive(Clone)]
pub struct Limiters {
    public: Limiter,
    protected: Limiter,
}

impl Limiters {
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            public: Arc::new(build_limiter(config.rate_public_per_min)?),
            protected: Arc::new(build_limiter(config.rate_protected_per_min)?),
        })
    }
}

fn build_limiter(requests_per_min: u32) -> Result<Governor<PeerIpKeyExtractor, NoOpMiddleware>> {
    let per_ms = (60_000 / u64::from(requests_per_min.max(1))).max(1);
    let cfg = GovernorConfigBuilder::default()
        .milliseconds_per_request(per_ms)
        .burst_size(requests_per_min)
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .ok_or_else(|| anyhow!("invalid rate limit: {requests_per_min} requests per minute"))?;
    Ok(Governor::new(&cfg))
}

async fn health() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

pub fn configure(cfg: &mut web::ServiceConfig, config: &Config, limiters: &Limiters) {
    // Public routes
    cfg.service(
        web::resource("/health")
            .wrap(limiters.public.clone())
            .route(web::get().to(health)),
    );

    // Protected routes
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware))
             // authentication
            .wrap(limiters.protected.clone()) // rate limiting
            .service(
                web::scope("/schedule")
                    // /schedule/effective?employee_id&date
                    .service(
                        web::resource("/effective")
                            .route(web::get().to(schedule::effective_schedule)),
                    )
                    // /schedule/weekly
                    .service(
                        web::resource("/weekly")
                            .route(web::get().to(schedule::list_weekly_schedules)),
                    )
                    // /schedule/weekly/{employee_id}
                    .service(
                        web::resource("/weekly/{employee_id}")
                            .route(web::get().to(schedule::get_weekly_schedule))
                            .route(web::put().to(schedule::update_weekly_schedule)),
                    )
                    // /schedule/override/{employee_id}
                    .service(
                        web::resource("/override/{employee_id}")
                            .route(web::put().to(schedule::set_schedule_override)),
                    ),
            )
            .service(
                web::scope("/attendance")
                    .service(web::resource("/check-in").route(web::post().to(attendance::check_in)))
                    .service(web::resource("/check-out").route(web::post().to(attendance::check_out)))
                    .service(web::resource("/today").route(web::get().to(attendance::today_attendance)))
                    .service(
                        web::resource("/report").route(web::get().to(attendance::attendance_report)),
                    ),
            )
            .service(
                web::scope("/office")
                    // /office
                    .service(
                        web::resource("")
                            .route(web::get().to(office::list_offices))
                            .route(web::post().to(office::create_office)),
                    )
                    // /office/{id}
                    .service(
                        web::resource("/{id}")
                            .route(web::put().to(office::update_office))
                            .route(web::delete().to(office::delete_office)),
                    ),
            )
            .service(
                web::scope("/device")
                    .service(
                        web::resource("")
                            .route(web::get().to(device::list_devices))
                            .route(web::post().to(device::register_device)),
                    )
                    .service(web::resource("/verify").route(web::get().to(device::verify_device)))
                    .service(
                        web::resource("/{id}/approve").route(web::put().to(device::approve_device)),
                    ),
            )
            .service(
                web::scope("/absence")
                    // /absence
                    .service(
                        web::resource("")
                            .route(web::get().to(absence::my_absences))
                            .route(web::post().to(absence::create_absence)),
                    )
                    // /absence/pending
                    .service(
                        web::resource("/pending").route(web::get().to(absence::pending_absences)),
                    )
                    // /absence/{id}/approve
                    .service(
                        web::resource("/{id}/approve")
                            .route(web::put().to(absence::approve_absence)),
                    )
                    // /absence/{id}/reject
                    .service(
                        web::resource("/{id}/reject")
                            .route(web::put().to(absence::reject_absence)),
                    ),
            ),
    );
}
