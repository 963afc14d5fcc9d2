use crate::{
    api::{
        announcement, asset, attendance, dashboard, document, employee, holiday, leave_request,
        project, task,
    },
    auth::{handlers, middleware::auth_middleware},
    config::Config,
    oauth,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};
use std::sync::Arc;

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    // Helper to build per-route limiter
    fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
        let per_ms = if requests_per_min == 0 {
            1
        } else {
            60_000 / requests_per_min as u64
        };
        let cfg = GovernorConfigBuilder::default()
            .per_millisecond(per_ms)
            .burst_size(requests_per_min)
            .key_extractor(PeerIpKeyExtractor)
            .finish()
            .unwrap();
        Governor::new(&cfg)
    }

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
            )
            // Social login pairs share the login limiter
            .service(
                web::resource("/{provider}/login")
                    .wrap(login_limiter.clone())
                    .route(web::get().to(oauth::handlers::social_login)),
            )
            .service(
                web::resource("/{provider}/callback")
                    .wrap(login_limiter.clone())
                    .route(web::get().to(oauth::handlers::social_callback)),
            ),
    );

    // Protected routes
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware)) // authentication
            .wrap(protected_limiter) // rate limiting
            .service(web::resource("/dashboard").route(web::get().to(dashboard::dashboard)))
            .service(web::resource("/profile").route(web::get().to(dashboard::profile)))
            .service(
                web::scope("/employees")
                    .service(
                        web::resource("")
                            .route(web::post().to(employee::create_employee))
                            .route(web::get().to(employee::list_employees)),
                    )
                    .service(
                        web::resource("/{id}")
                            .route(web::put().to(employee::update_employee))
                            .route(web::get().to(employee::get_employee))
                            .route(web::delete().to(employee::delete_employee)),
                    ),
            )
            .service(
                web::scope("/announcements")
                    .service(
                        web::resource("")
                            .route(web::get().to(announcement::announcement_list))
                            .route(web::post().to(announcement::announcement_create)),
                    )
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(announcement::announcement_get))
                            .route(web::put().to(announcement::announcement_update))
                            .route(web::delete().to(announcement::announcement_delete)),
                    ),
            )
            .service(
                web::scope("/assets")
                    .service(
                        web::resource("")
                            .route(web::get().to(asset::asset_list))
                            .route(web::post().to(asset::asset_create)),
                    )
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(asset::asset_get))
                            .route(web::put().to(asset::asset_update))
                            .route(web::delete().to(asset::asset_delete)),
                    ),
            )
            .service(
                web::scope("/attendance")
                    .service(
                        web::resource("/clock-in").route(web::post().to(attendance::clock_in)),
                    )
                    .service(
                        web::resource("/clock-out").route(web::put().to(attendance::clock_out)),
                    )
                    .service(
                        web::resource("").route(web::get().to(attendance::attendance_history)),
                    )
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(attendance::attendance_get))
                            .route(web::put().to(attendance::attendance_edit)),
                    ),
            )
            .service(
                web::scope("/leave")
                    .service(
                        web::resource("")
                            .route(web::get().to(leave_request::leave_list))
                            .route(web::post().to(leave_request::create_leave)),
                    )
                    .service(web::resource("/{id}").route(web::get().to(leave_request::get_leave)))
                    .service(
                        web::resource("/{id}/approve")
                            .route(web::put().to(leave_request::approve_leave)),
                    )
                    .service(
                        web::resource("/{id}/reject")
                            .route(web::put().to(leave_request::reject_leave)),
                    ),
            )
            .service(
                web::scope("/holidays")
                    .service(
                        web::resource("")
                            .route(web::get().to(holiday::holiday_list))
                            .route(web::post().to(holiday::holiday_create)),
                    )
                    .service(
                        web::resource("/{id}")
                            .route(web::put().to(holiday::holiday_update))
                            .route(web::delete().to(holiday::holiday_delete)),
                    ),
            )
            .service(
                web::scope("/documents")
                    .service(
                        web::resource("")
                            .route(web::get().to(document::document_list))
                            .route(web::post().to(document::document_upload)),
                    )
                    .service(
                        web::resource("/{id}/download")
                            .route(web::get().to(document::document_download)),
                    )
                    .service(
                        web::resource("/{id}")
                            .route(web::put().to(document::document_update))
                            .route(web::delete().to(document::document_delete)),
                    ),
            )
            .service(
                web::scope("/projects")
                    .service(
                        web::resource("")
                            .route(web::get().to(project::project_list))
                            .route(web::post().to(project::project_create)),
                    )
                    .service(
                        web::resource("/{id}")
                            .route(web::put().to(project::project_update))
                            .route(web::delete().to(project::project_delete)),
                    ),
            )
            .service(
                web::scope("/tasks")
                    .service(
                        web::resource("")
                            .route(web::get().to(task::task_list))
                            .route(web::post().to(task::task_create)),
                    )
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(task::task_get))
                            .route(web::put().to(task::task_update))
                            .route(web::delete().to(task::task_delete)),
                    ),
            ),
    );
}
