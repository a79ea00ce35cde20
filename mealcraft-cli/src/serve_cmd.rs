use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use axum_extra::extract::cookie::{Cookie, SameSite};
use axum_extra::extract::{CookieJar, Form};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use mealcraft_agent::{
    DietaryTag, ExportFormat, MealPlan, MealPlanner, ShoppingList, UserConstraints,
};
use mealcraft_llm::{Error, ErrorKind, LlmProvider};

use crate::session::{new_session_id, SessionStore, SESSION_COOKIE};

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

pub struct AppError {
    status: StatusCode,
    message: String,
}

impl AppError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: msg.into(),
        }
    }
}

impl From<Error> for AppError {
    fn from(err: Error) -> Self {
        let status = match err.kind() {
            ErrorKind::SessionNotFound => StatusCode::NOT_FOUND,
            ErrorKind::Unsupported | ErrorKind::InvalidArgument => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            error!(error = %err, "request failed");
        }
        Self {
            status,
            message: err.message().to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "error": self.message });
        (self.status, Json(body)).into_response()
    }
}

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

pub struct AppState<P> {
    pub planner: Arc<MealPlanner<P>>,
    pub sessions: SessionStore,
}

impl<P> Clone for AppState<P> {
    fn clone(&self) -> Self {
        Self {
            planner: Arc::clone(&self.planner),
            sessions: self.sessions.clone(),
        }
    }
}

impl<P> AppState<P> {
    pub fn new(planner: MealPlanner<P>) -> Self {
        Self {
            planner: Arc::new(planner),
            sessions: SessionStore::new(),
        }
    }

    /// Cap the number of stored sessions
    pub fn with_max_sessions(mut self, max_sessions: usize) -> Self {
        self.sessions = SessionStore::with_capacity(max_sessions);
        self
    }
}

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Fields of the planning form; all optional, numbers arrive as text.
#[derive(Debug, Default, Deserialize)]
pub struct PlanForm {
    pub dietary: Option<String>,
    pub budget: Option<String>,
    pub calories: Option<String>,
    pub time: Option<String>,
}

impl PlanForm {
    pub fn constraints(&self) -> std::result::Result<UserConstraints, AppError> {
        let defaults = UserConstraints::default();
        let budget = match non_empty(&self.budget) {
            Some(raw) => raw
                .parse::<f64>()
                .map_err(|_| AppError::bad_request(format!("invalid budget: {}", raw)))?,
            None => defaults.budget,
        };
        let calorie_goal = match non_empty(&self.calories) {
            Some(raw) => raw
                .parse::<u32>()
                .map_err(|_| AppError::bad_request(format!("invalid calories: {}", raw)))?,
            None => defaults.calorie_goal,
        };

        Ok(UserConstraints {
            dietary: non_empty(&self.dietary)
                .map(DietaryTag::parse)
                .unwrap_or(defaults.dietary),
            budget,
            calorie_goal,
            prep_time: non_empty(&self.time)
                .map(str::to_string)
                .unwrap_or(defaults.prep_time),
        })
    }
}

fn non_empty(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

#[derive(Debug, Serialize)]
pub struct PlanResponse {
    pub meal_plan: MealPlan,
    pub shopping_list: ShoppingList,
    pub remaining_budget: f64,
}

#[derive(Debug, Deserialize)]
pub struct ShoppingListQuery {
    pub format: Option<String>,
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn build_router<P: LlmProvider + 'static>(state: AppState<P>) -> Router {
    Router::new()
        .route("/", get(index).post(submit_plan::<P>))
        .route("/shopping-list", get(shopping_list::<P>))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub async fn run_serve<P: LlmProvider + 'static>(
    state: AppState<P>,
    bind: &str,
    port: u16,
) -> Result<()> {
    let app = build_router(state);
    let addr: SocketAddr = format!("{bind}:{port}").parse()?;
    info!("mealcraft listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("mealcraft shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

const INDEX_HTML: &str = "<!DOCTYPE html>\
<html><head><title>mealcraft</title></head><body>\
<h1>mealcraft</h1>\
<form method=\"post\" action=\"/\">\
<label>Dietary <select name=\"dietary\">\
<option value=\"none\">none</option>\
<option value=\"vegetarian\">vegetarian</option>\
<option value=\"vegan\">vegan</option>\
<option value=\"gluten-free\">gluten-free</option>\
</select></label>\
<label>Budget ($) <input name=\"budget\" type=\"number\" step=\"0.01\" value=\"30\"></label>\
<label>Calories <input name=\"calories\" type=\"number\" value=\"2000\"></label>\
<label>Prep time <input name=\"time\" value=\"30 mins\"></label>\
<button type=\"submit\">Plan my day</button>\
</form>\
<p><a href=\"/shopping-list\">Shopping list</a></p>\
</body></html>";

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn health() -> &'static str {
    "ok"
}

async fn submit_plan<P: LlmProvider + 'static>(
    State(state): State<AppState<P>>,
    jar: CookieJar,
    Form(form): Form<PlanForm>,
) -> std::result::Result<(CookieJar, Json<PlanResponse>), AppError> {
    let constraints = form.constraints()?;
    let plan = state.planner.plan(&constraints).await?;
    let shopping_list = ShoppingList::from_plan(&plan);

    let session_id = jar
        .get(SESSION_COOKIE)
        .map(|c| c.value().to_string())
        .unwrap_or_else(new_session_id);
    state.sessions.save_plan(&session_id, &plan)?;

    let cookie = Cookie::build((SESSION_COOKIE, session_id))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax);

    let response = PlanResponse {
        remaining_budget: plan.remaining_budget,
        meal_plan: plan,
        shopping_list,
    };
    Ok((jar.add(cookie), Json(response)))
}

async fn shopping_list<P: LlmProvider + 'static>(
    State(state): State<AppState<P>>,
    jar: CookieJar,
    Query(query): Query<ShoppingListQuery>,
) -> std::result::Result<Response, AppError> {
    let format: ExportFormat = query.format.as_deref().unwrap_or("text").parse()?;

    let session_id = jar
        .get(SESSION_COOKIE)
        .map(|c| c.value().to_string())
        .ok_or_else(|| Error::session_not_found(""))?;
    let plan = state.sessions.load_plan(&session_id)?;
    let body = ShoppingList::from_plan(&plan).render(format)?;

    let content_type = match format {
        ExportFormat::Text => "text/plain; charset=utf-8",
        ExportFormat::Json => "application/json",
    };
    Ok(([(header::CONTENT_TYPE, content_type)], body).into_response())
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use tower::ServiceExt;

    use mealcraft_agent::testing::{cheap_response, ScriptedProvider};
    use mealcraft_agent::MealPlanner;

    use super::{build_router, AppState};

    // -----------------------------------------------------------------------
    // HTTP helpers
    // -----------------------------------------------------------------------

    fn state() -> AppState<ScriptedProvider> {
        AppState::new(MealPlanner::new(ScriptedProvider::with_texts(
            (0..4).map(|_| cheap_response(1.0)),
        )))
    }

    async fn send(
        state: &AppState<ScriptedProvider>,
        request: Request<Body>,
    ) -> axum::response::Response {
        build_router(state.clone()).oneshot(request).await.unwrap()
    }

    fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        builder.body(Body::empty()).unwrap()
    }

    fn post_form(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_string(response: axum::response::Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), 1_048_576)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn session_cookie(response: &axum::response::Response) -> String {
        let set_cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .expect("should set a session cookie")
            .to_str()
            .unwrap();
        set_cookie.split(';').next().unwrap().to_string()
    }

    // -----------------------------------------------------------------------
    // Tests
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn index_returns_form() {
        let resp = send(&state(), get("/", None)).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let content_type = resp.headers()[header::CONTENT_TYPE].to_str().unwrap().to_string();
        assert!(content_type.contains("text/html"));
        let body = body_string(resp).await;
        assert!(body.contains("name=\"calories\""));
    }

    #[tokio::test]
    async fn health_is_ok() {
        let resp = send(&state(), get("/health", None)).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_string(resp).await, "ok");
    }

    #[tokio::test]
    async fn shopping_list_without_session_is_404() {
        let resp = send(&state(), get("/shopping-list", None)).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body: serde_json::Value = serde_json::from_str(&body_string(resp).await).unwrap();
        assert_eq!(body["error"], "No meal plan found");

        let resp = send(&state(), get("/shopping-list", Some("mealcraft_session=stale"))).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn submit_then_fetch_shopping_list() {
        let state = state();

        let resp = send(
            &state,
            post_form("dietary=vegan&budget=30&calories=2000&time=20+mins"),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let cookie = session_cookie(&resp);
        assert!(cookie.starts_with("mealcraft_session="));

        let body: serde_json::Value = serde_json::from_str(&body_string(resp).await).unwrap();
        assert_eq!(body["remaining_budget"], 18.0);
        assert_eq!(body["meal_plan"]["meals"]["breakfast"]["status"], "planned");
        assert_eq!(body["meal_plan"]["constraints"]["prep_time"], "20 mins");
        assert_eq!(body["shopping_list"]["total_items"], 9);
        assert_eq!(state.sessions.len(), 1);

        let resp = send(&state, get("/shopping-list", Some(&cookie))).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let text = body_string(resp).await;
        assert!(text.starts_with("Shopping List"));
        assert!(text.contains("- Tomato: 4.0 piece"));

        let resp = send(&state, get("/shopping-list?format=json", Some(&cookie))).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let json: serde_json::Value = serde_json::from_str(&body_string(resp).await).unwrap();
        assert_eq!(json["total_items"], 9);

        let resp = send(&state, get("/shopping-list?format=csv", Some(&cookie))).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = serde_json::from_str(&body_string(resp).await).unwrap();
        assert_eq!(body["error"], "Unsupported format: csv");
    }

    #[tokio::test]
    async fn anonymous_posts_stay_within_session_cap() {
        let state = AppState::new(MealPlanner::new(ScriptedProvider::with_texts(
            (0..40).map(|_| cheap_response(1.0)),
        )))
        .with_max_sessions(5);

        for _ in 0..10 {
            let resp = send(&state, post_form("budget=30")).await;
            assert_eq!(resp.status(), StatusCode::OK);
        }
        assert_eq!(state.sessions.len(), 5);
    }

    #[tokio::test]
    async fn invalid_budget_is_400() {
        let state = state();
        let resp = send(&state, post_form("budget=lots")).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(state.planner.provider().call_count(), 0);

        let resp = send(&state, post_form("budget=-4")).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn empty_form_uses_defaults() {
        let state = state();
        let resp = send(&state, post_form("")).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: serde_json::Value = serde_json::from_str(&body_string(resp).await).unwrap();
        assert_eq!(body["meal_plan"]["initial_budget"], 30.0);
        assert_eq!(body["meal_plan"]["constraints"]["dietary"], "none");
    }
}
