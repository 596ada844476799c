use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::{
    Json, Router,
    routing::{delete, get, patch, post, put},
};
use sermon_backend::{
    AppState,
    api::{ApiResponse, ErrorCode},
    config::Config,
    email::Mailer,
    middleware::{
        CacheContext, RateLimiter, api_key_guard, cors_guard, log_errors, rate_limit,
        response_cache, session_auth,
    },
    routes,
    storage::BlobStore,
};
use sqlx::Executor;
use sqlx::postgres::PgPoolOptions;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

async fn not_found() -> (axum::http::StatusCode, Json<ApiResponse<()>>) {
    (
        axum::http::StatusCode::NOT_FOUND,
        Json(ApiResponse::failure(ErrorCode::NotFound, "resource not found".to_string())),
    )
}

#[tokio::main]
async fn main() {
    // 初始化日志
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 加载配置
    let config = Arc::new(Config::from_env().expect("Failed to load configuration"));

    // 设置数据库连接池
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .after_connect(|conn, _meta| {
            Box::pin(async move {
                conn.execute("SET application_name = 'sermon_backend';").await?;
                Ok(())
            })
        })
        .connect(&config.database_url)
        .await
        .expect("Failed to connect to Postgres");

    // 设置 Redis 客户端
    let redis = Arc::new(
        redis::Client::open(config.redis_url.clone()).expect("Failed to create Redis client"),
    );

    // 设置应用状态
    let state = AppState {
        pool,
        config: config.clone(),
        redis: redis.clone(),
        mailer: Arc::new(Mailer::new(&config)),
        blobs: Arc::new(BlobStore::new(&config)),
    };

    // 设置限流器和响应缓存
    let rate_limiter = Arc::new(RateLimiter::new(redis.clone(), config.clone()));
    let cache_ctx = Arc::new(CacheContext { redis, config: config.clone() });

    // 公开只读路由，无需 Bearer 令牌，密钥检查由网关层处理
    let public_routes = Router::new()
        .route("/sermons", get(routes::sermon::list_sermons))
        .route("/sermons/{id}", get(routes::sermon::get_sermon))
        .route("/speakers", get(routes::speaker::list_speakers))
        .route("/speakers/{id}", get(routes::speaker::get_speaker))
        .route("/speakers/{id}/sermons", get(routes::speaker::get_speaker_sermons))
        .route("/topics", get(routes::topic::list_topics))
        .route("/topics/{id}", get(routes::topic::get_topic))
        .route("/topics/{id}/sermons", get(routes::topic::get_topic_sermons))
        .route("/home/config", get(routes::curation::get_home_config))
        .route("/launch-screen", get(routes::curation::get_launch_screen));

    // 认证流程路由
    let auth_routes = Router::new()
        .route("/auth/register", post(routes::auth::register))
        .route("/auth/login", post(routes::auth::login))
        .route("/auth/send-verification-code", post(routes::auth::send_verification_code))
        .route("/auth/forgot-password", post(routes::auth::forgot_password))
        .route("/auth/verify-reset-token", post(routes::auth::verify_reset_token))
        .route("/auth/reset-password", post(routes::auth::reset_password));

    // 用户路由，需要 Bearer 令牌
    let user_routes = Router::new()
        .route("/users/me", get(routes::user::get_me))
        .route("/favorites", get(routes::favorite::list_sermon_favorites))
        .route("/favorites", post(routes::favorite::add_sermon_favorite))
        .route("/favorites/{sermon_id}", get(routes::favorite::check_sermon_favorite))
        .route("/favorites/{sermon_id}", delete(routes::favorite::remove_sermon_favorite))
        .route("/speaker-favorites", get(routes::favorite::list_speaker_favorites))
        .route("/speaker-favorites", post(routes::favorite::add_speaker_favorite))
        .route("/speaker-favorites/{speaker_id}", get(routes::favorite::check_speaker_favorite))
        .route(
            "/speaker-favorites/{speaker_id}",
            delete(routes::favorite::remove_speaker_favorite),
        )
        .route("/topic-favorites", get(routes::favorite::list_topic_favorites))
        .route("/topic-favorites", post(routes::favorite::add_topic_favorite))
        .route("/topic-favorites/{topic_id}", get(routes::favorite::check_topic_favorite))
        .route("/topic-favorites/{topic_id}", delete(routes::favorite::remove_topic_favorite))
        .route("/history", get(routes::history::list_history))
        .route("/history", post(routes::history::record_progress))
        .route("/history", delete(routes::history::clear_history))
        .route("/history/{sermon_id}", get(routes::history::get_progress))
        .route("/history/{sermon_id}", delete(routes::history::delete_history_entry))
        .route("/submissions", get(routes::submission::list_my_submissions))
        .route("/submissions", post(routes::submission::submit_sermon))
        .route("/submissions/{id}", get(routes::submission::get_my_submission))
        .route("/submissions/{id}", delete(routes::submission::withdraw_submission))
        .layer(axum::middleware::from_fn_with_state(config.clone(), session_auth));

    // 管理后台路由，仅允许携带写/管理 API 密钥的客户端访问
    let admin_routes = Router::new()
        .route("/sermons", post(routes::sermon::create_sermon))
        .route("/sermons/{id}", put(routes::sermon::update_sermon))
        .route("/sermons/{id}", delete(routes::sermon::delete_sermon))
        .route("/sermons/{id}/status", patch(routes::sermon::update_sermon_status))
        .route("/speakers", post(routes::speaker::create_speaker))
        .route("/speakers/{id}", put(routes::speaker::update_speaker))
        .route("/speakers/{id}", delete(routes::speaker::delete_speaker))
        .route("/speakers/{id}/status", patch(routes::speaker::update_speaker_status))
        .route("/topics", post(routes::topic::create_topic))
        .route("/topics/{id}", put(routes::topic::update_topic))
        .route("/topics/{id}", delete(routes::topic::delete_topic))
        .route("/topics/{id}/status", patch(routes::topic::update_topic_status))
        .route("/topics/{id}/sermons", put(routes::topic::replace_topic_sermons))
        .route("/users", get(routes::user::list_users))
        .route("/users/{id}", get(routes::user::get_user))
        .route("/users/{id}", put(routes::user::update_user))
        .route("/users/{id}/status", patch(routes::user::update_user_status))
        .route("/home/config", put(routes::curation::put_curation_home_config))
        .route("/launch-screen", put(routes::curation::put_curation_launch_screen))
        .route("/curation/home-config", get(routes::curation::get_curation_home_config))
        .route("/curation/home-config", put(routes::curation::put_curation_home_config))
        .route("/curation/home-config", patch(routes::curation::patch_curation_home_config))
        .route(
            "/curation/discover-config",
            get(routes::curation::get_curation_discover_config),
        )
        .route(
            "/curation/discover-config",
            put(routes::curation::put_curation_discover_config),
        )
        .route(
            "/curation/discover-config",
            patch(routes::curation::patch_curation_discover_config),
        )
        .route(
            "/curation/launch-screen-config",
            get(routes::curation::get_curation_launch_screen),
        )
        .route(
            "/curation/launch-screen-config",
            put(routes::curation::put_curation_launch_screen),
        )
        .route(
            "/curation/launch-screen-config",
            patch(routes::curation::patch_curation_launch_screen),
        )
        .route("/stats/overview", get(routes::stats::get_overview))
        .route("/stats/top-sermons", get(routes::stats::get_top_sermons))
        .route("/stats/top-speakers", get(routes::stats::get_top_speakers))
        .route("/stats/sermons/{id}/favorites", get(routes::stats::get_sermon_favorite_count))
        .route(
            "/stats/speakers/{id}/favorites",
            get(routes::stats::get_speaker_favorite_count),
        )
        .route("/stats/favorites-trend", get(routes::stats::get_favorites_trend))
        .route("/upload/audio", post(routes::upload::upload_audio))
        .route("/upload/image", post(routes::upload::upload_image))
        .route("/upload/{*path}", delete(routes::upload::delete_file));

    let api = Router::new()
        .merge(public_routes)
        .merge(auth_routes)
        .merge(user_routes)
        .merge(admin_routes);

    let router = Router::new()
        .nest(&config.api_base_uri, api)
        .fallback(not_found)
        // 中间件从内到外：缓存最靠近处理器，然后是密钥网关和限流器，
        // 来源守卫在最外层，保证每个响应都带 CORS 头
        .layer(axum::middleware::from_fn_with_state(cache_ctx, response_cache))
        .layer(axum::middleware::from_fn_with_state(config.clone(), api_key_guard))
        .layer(axum::middleware::from_fn_with_state(rate_limiter, rate_limit))
        .layer(axum::middleware::from_fn(log_errors))
        .layer(axum::middleware::from_fn_with_state(config.clone(), cors_guard))
        .layer(TraceLayer::new_for_http());

    let app = router.with_state(state);

    let addr = SocketAddr::new(
        config.server_host.parse().unwrap_or_else(|_| {
            tracing::warn!("Invalid server_host, falling back to dual-stack default");
            IpAddr::V6(std::net::Ipv6Addr::UNSPECIFIED)
        }),
        config.server_port,
    );
    // 启动服务器
    tracing::info!("Server listening on {}", addr);
    axum::serve(
        tokio::net::TcpListener::bind(&addr)
            .await
            .expect("Failed to bind"),
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .expect("Failed to start server");
}
