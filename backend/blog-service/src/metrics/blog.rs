use lazy_static::lazy_static;
use prometheus::{
    register_histogram_vec, register_int_counter, register_int_counter_vec, HistogramVec,
    IntCounter, IntCounterVec,
};

lazy_static! {
    /// Registration attempts by result (created, invalid).
    pub static ref REGISTRATIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "blog_registrations_total",
        "Registration attempts segmented by result",
        &["result"]
    )
    .expect("failed to register blog_registrations_total");

    /// Login attempts by outcome (success, failure).
    pub static ref LOGIN_ATTEMPTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "blog_login_attempts_total",
        "Login attempts segmented by outcome",
        &["outcome"]
    )
    .expect("failed to register blog_login_attempts_total");

    /// Password resets by result (updated, unknown_user, invalid).
    pub static ref PASSWORD_RESETS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "blog_password_resets_total",
        "Password reset attempts segmented by result",
        &["result"]
    )
    .expect("failed to register blog_password_resets_total");

    /// Blog writes by operation (create, edit, delete).
    pub static ref BLOG_WRITES_TOTAL: IntCounterVec = register_int_counter_vec!(
        "blog_writes_total",
        "Blog writes segmented by operation",
        &["op"]
    )
    .expect("failed to register blog_writes_total");

    pub static ref COMMENTS_CREATED_TOTAL: IntCounter = register_int_counter!(
        "blog_comments_created_total",
        "Comments created"
    )
    .expect("failed to register blog_comments_created_total");

    /// HTTP request latency by method and status class.
    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "blog_http_request_duration_seconds",
        "HTTP request duration segmented by method and status",
        &["method", "status"]
    )
    .expect("failed to register blog_http_request_duration_seconds");
}
