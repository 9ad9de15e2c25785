use crate::{
    api::{attendance, bonus, catalog, client, employee, financial, job_title, report, wash},
    auth::{handlers, middleware::auth_middleware},
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfig, GovernorConfigBuilder, PeerIpKeyExtractor,
    governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};
use std::sync::Arc;
use tracing::warn;

// Helper to build per-route limiter
fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
    let per_ms = if requests_per_min == 0 {
        1
    } else {
        (60_000 / requests_per_min as u64).max(1)
    };
    let cfg = GovernorConfigBuilder::default()
        .per_millisecond(per_ms)
        .burst_size(requests_per_min.max(1))
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .unwrap_or_else(|| {
            warn!(requests_per_min, "Invalid rate limit, using governor defaults");
            GovernorConfig::default()
        });
    Governor::new(&cfg)
}

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    let login_limiter = Arc::new(build_limiter(config.rate_login_per_min));
    let register_limiter = Arc::new(build_limiter(config.rate_register_per_min));
    let refresh_limiter = Arc::new(build_limiter(config.rate_refresh_per_min));
    let protected_limiter = Arc::new(build_limiter(config.rate_protected_per_min));

    // Public routes
    cfg.service(
        web::scope("/auth")
            .service(
                web::resource("/login")
                    .wrap(login_limiter.clone())
                    .route(web::post().to(handlers::login)),
            )
            .service(
                web::resource("/register")
                    .wrap(register_limiter.clone())
                    .route(web::post().to(handlers::register)),
            )
            .service(
                web::resource("/refresh")
                    .wrap(refresh_limiter.clone())
                    .route(web::post().to(handlers::refresh_token)),
            )
            .service(
                web::resource("/logout")
                    .wrap(login_limiter.clone())
                    .route(web::post().to(handlers::logout)),
            ),
    );

    // Protected routes
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware))
            .wrap(protected_limiter)
            .service(web::resource("/me").route(web::get().to(handlers::me)))
            .service(
                web::scope("/users")
                    .service(
                        web::resource("/pending")
                            .route(web::get().to(handlers::list_pending_users)),
                    )
                    .service(
                        web::resource("/{user_id}/approve")
                            .route(web::post().to(handlers::approve_user)),
                    ),
            )
            .service(
                web::scope("/job-titles")
                    .service(
                        web::resource("")
                            .route(web::get().to(job_title::list_job_titles))
                            .route(web::post().to(job_title::create_job_title)),
                    )
                    .service(
                        web::resource("/{id}")
                            .route(web::delete().to(job_title::delete_job_title)),
                    ),
            )
            .service(
                web::scope("/employees")
                    .service(
                        web::resource("")
                            .route(web::post().to(employee::create_employee))
                            .route(web::get().to(employee::list_employees)),
                    )
                    .service(
                        web::resource("/{employee_id}")
                            .route(web::get().to(employee::get_employee))
                            .route(web::put().to(employee::update_employee))
                            .route(web::delete().to(employee::deactivate_employee)),
                    ),
            )
            .service(
                web::scope("/clients")
                    .service(
                        web::resource("")
                            .route(web::get().to(client::list_clients))
                            .route(web::post().to(client::create_client)),
                    )
                    .service(
                        web::resource("/{id}/washes").route(web::get().to(client::client_washes)),
                    )
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(client::get_client))
                            .route(web::put().to(client::update_client))
                            .route(web::delete().to(client::delete_client)),
                    ),
            )
            .service(
                web::scope("/box-types")
                    .service(
                        web::resource("")
                            .route(web::get().to(catalog::list_box_types))
                            .route(web::post().to(catalog::create_box_type)),
                    )
                    .service(
                        web::resource("/{id}")
                            .route(web::delete().to(catalog::deactivate_box_type)),
                    ),
            )
            .service(
                web::scope("/product-types")
                    .service(
                        web::resource("")
                            .route(web::get().to(catalog::list_product_types))
                            .route(web::post().to(catalog::create_product_type)),
                    )
                    .service(
                        web::resource("/{id}")
                            .route(web::delete().to(catalog::deactivate_product_type)),
                    ),
            )
            .service(
                web::scope("/washes")
                    .service(
                        web::resource("/carreta")
                            .route(web::get().to(wash::list_carreta))
                            .route(web::post().to(wash::create_carreta)),
                    )
                    .service(
                        web::resource("/carreta/{id}")
                            .route(web::put().to(wash::update_carreta))
                            .route(web::delete().to(wash::delete_carreta)),
                    )
                    .service(
                        web::resource("/dirty")
                            .route(web::get().to(wash::list_dirty))
                            .route(web::post().to(wash::create_dirty)),
                    )
                    .service(
                        web::resource("/dirty/{id}").route(web::delete().to(wash::delete_dirty)),
                    )
                    .service(
                        web::resource("/cargo")
                            .route(web::get().to(wash::list_cargo))
                            .route(web::post().to(wash::create_cargo)),
                    )
                    .service(
                        web::resource("/cargo/{id}").route(web::delete().to(wash::delete_cargo)),
                    )
                    .service(web::resource("/export").route(web::get().to(wash::export_washes))),
            )
            .service(
                web::scope("/financial")
                    .service(
                        web::resource("")
                            .route(web::get().to(financial::list_entries))
                            .route(web::post().to(financial::create_entry)),
                    )
                    // fixed segments before /{id}
                    .service(
                        web::resource("/rollup").route(web::get().to(financial::monthly_rollup)),
                    )
                    .service(
                        web::resource("/rollup/export")
                            .route(web::get().to(financial::export_rollup)),
                    )
                    .service(
                        web::resource("/export").route(web::get().to(financial::export_ledger)),
                    )
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(financial::get_entry))
                            .route(web::put().to(financial::update_entry))
                            .route(web::delete().to(financial::delete_entry)),
                    ),
            )
            .service(
                web::scope("/attendance")
                    .service(
                        web::resource("")
                            .route(web::post().to(attendance::register_attendance))
                            .route(web::get().to(attendance::list_attendance)),
                    )
                    .service(
                        web::resource("/{id}")
                            .route(web::put().to(attendance::update_attendance))
                            .route(web::delete().to(attendance::delete_attendance)),
                    ),
            )
            .service(
                web::scope("/bonus")
                    .service(web::resource("/roster").route(web::get().to(bonus::roster)))
                    .service(
                        web::resource("/eligibility/{employee_id}")
                            .route(web::get().to(bonus::employee_eligibility)),
                    )
                    .service(web::resource("/grant").route(web::post().to(bonus::grant)))
                    .service(
                        web::resource("/payments").route(web::get().to(bonus::list_payments)),
                    ),
            )
            .service(
                web::scope("/reports")
                    .service(web::resource("/period").route(web::get().to(report::period)))
                    .service(
                        web::resource("/period/export").route(web::get().to(report::export_period)),
                    )
                    .service(
                        web::resource("/dashboard").route(web::get().to(report::dashboard)),
                    ),
            ),
    );
}

// LOGIN
//  ├─ access_token (15 min)
//  └─ refresh_token (7 days)

// API REQUEST
//  └─ Authorization: Bearer access_token

// ACCESS EXPIRED
//  └─ POST /auth/refresh with refresh_token
//       └─ returns new access_token
