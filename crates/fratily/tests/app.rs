//! Application assembly tests: a built application handles requests the
//! way its registration describes.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use fratily::prelude::*;
use fratily::middleware::REQUEST_ID_HEADER;
use http::{Method, StatusCode};

type Log = Arc<Mutex<Vec<String>>>;

/// Records its entry and exit in a shared log.
struct Tag {
    name: &'static str,
    log: Log,
}

impl Middleware for Tag {
    fn name(&self) -> &'static str {
        self.name
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut MiddlewareContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, FaultResult<Response>> {
        Box::pin(async move {
            self.log.lock().unwrap().push(format!("{}>", self.name));
            let response = next.run(ctx, request).await?;
            self.log.lock().unwrap().push(format!("<{}", self.name));
            Ok(response)
        })
    }
}

fn tag(name: &'static str, log: &Log) -> Tag {
    Tag {
        name,
        log: Arc::clone(log),
    }
}

struct Users;

impl Controller for Users {
    fn methods(&self) -> Vec<MethodInfo> {
        vec![
            MethodInfo::public("show").param(ParamSpec::new("id")),
            MethodInfo::public("create").static_method(),
        ]
    }

    fn call(self: Arc<Self>, method: &str, args: ActionArgs) -> fratily::core::ActionFuture {
        let method = method.to_string();
        Box::pin(async move {
            match method.as_str() {
                "show" => Ok(ActionValue::from(format!("user {}", args.require_str("id")?))),
                other => Err(Fault::not_callable(other, "not an action")),
            }
        })
    }
}

fn request(method: Method, uri: &str) -> Request {
    http::Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn text(response: &Response) -> String {
    String::from_utf8(response.body().contents().unwrap().to_vec()).unwrap()
}

#[tokio::test]
async fn test_middleware_layers_nest_around_the_action() {
    let log: Log = Arc::default();

    let mut app = Application::new();
    app.append(tag("outer", &log))
        .before_action(tag("app_before", &log))
        .after_action(tag("app_after", &log))
        .register_middleware("route_before", tag("route_before", &log))
        .register_middleware("route_after", tag("route_after", &log));

    let action_log = Arc::clone(&log);
    app.route(
        Some("report"),
        "/report",
        MethodSet::GET,
        Action::new("report", [], move |_| {
            let log = Arc::clone(&action_log);
            async move {
                log.lock().unwrap().push("action".to_string());
                FaultResult::Ok("report")
            }
        }),
        RouteData::new().before("route_before").after("route_after"),
    )
    .unwrap();

    let kernel = app.build().unwrap();
    let response = kernel.handle(request(Method::GET, "/report")).await.unwrap();

    assert_eq!(text(&response), "report");
    assert_eq!(
        *log.lock().unwrap(),
        [
            "outer>",
            "app_before>",
            "route_before>",
            "route_after>",
            "app_after>",
            "<app_after",
            "<route_after",
            "action",
            "<route_before",
            "<app_before",
            "<outer",
        ]
    );
}

#[tokio::test]
async fn test_prepend_puts_middleware_first() {
    let log: Log = Arc::default();

    let mut app = Application::new();
    app.append(tag("second", &log)).prepend(tag("first", &log));
    app.get("/", Action::new("root", [], |_| async { FaultResult::Ok(()) }))
        .unwrap();

    let kernel = app.build().unwrap();
    assert_eq!(
        kernel.chain().names(),
        ["request_id", "first", "second", "routing", "dispatch"]
    );

    kernel.handle(request(Method::GET, "/")).await.unwrap();
    assert_eq!(log.lock().unwrap()[..2], ["first>", "second>"]);
}

#[tokio::test]
async fn test_controller_action_strings() {
    let mut app = Application::new();
    app.controller("users", Users);
    app.get("/users/{id}", "users:show").unwrap();

    let err = app.post("/users", "users:create").unwrap_err();
    assert!(matches!(err, Fault::ActionMethodNotPublicOrIsStatic { .. }));

    let err = app.get("/users", "users:index").unwrap_err();
    assert!(matches!(err, Fault::ActionNotCallable { .. }));

    let kernel = app.build().unwrap();
    let response = kernel.handle(request(Method::GET, "/users/7")).await.unwrap();
    assert_eq!(text(&response), "user 7");
}

#[tokio::test]
async fn test_method_not_allowed_lists_allowed_methods() {
    let mut app = Application::new();
    app.get("/widgets/{id}", Action::new("show", [], |_| async { FaultResult::Ok("w") }))
        .unwrap();
    let kernel = app.build().unwrap();

    let response = kernel
        .handle(request(Method::DELETE, "/widgets/1"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(response.headers()[http::header::ALLOW], "GET");

    let response = kernel.handle(request(Method::GET, "/gadgets/1")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_continue_mode_lets_outer_middleware_answer() {
    let mut config = FratilyConfig::default();
    config.routing.not_found_mode = NotFoundPolicy::Continue;

    let mut app = Application::with_config(config);
    app.append(FnMiddleware::new("legacy", |ctx, request, next| {
        Box::pin(async move {
            let response = next.run(ctx, request).await?;
            if response.body().is_empty() {
                return Ok(Response::text(StatusCode::OK, "legacy"));
            }
            Ok(response)
        })
    }));
    app.get("/new", Action::new("new", [], |_| async { FaultResult::Ok("new") }))
        .unwrap();
    let kernel = app.build().unwrap();

    let response = kernel.handle(request(Method::GET, "/old")).await.unwrap();
    assert_eq!(text(&response), "legacy");

    let response = kernel.handle(request(Method::GET, "/new")).await.unwrap();
    assert_eq!(text(&response), "new");
}

#[tokio::test]
async fn test_debug_mode_shows_fault_details() {
    let invalid = || Action::new("listing", [], |_| async { FaultResult::Ok(vec![1, 2]) });

    let mut app = Application::with_config(FratilyConfig::development());
    app.get("/list", invalid()).unwrap();
    let response = app
        .build()
        .unwrap()
        .handle(request(Method::GET, "/list"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(text(&response).contains("InvalidActionResult"));

    let mut app = Application::new();
    app.get("/list", invalid()).unwrap();
    let response = app
        .build()
        .unwrap()
        .handle(request(Method::GET, "/list"))
        .await
        .unwrap();
    assert!(!text(&response).contains("InvalidActionResult"));
}

#[tokio::test]
async fn test_request_id_echoed_when_trusted() {
    let id = "018f6b2e-7c3a-7d40-9a53-2f1c8e4b6a10";

    let mut app = Application::new();
    app.trust_request_ids(true);
    app.get("/", Action::new("root", [], |_| async { FaultResult::Ok(()) }))
        .unwrap();
    let kernel = app.build().unwrap();

    let mut req = request(Method::GET, "/");
    req.headers_mut()
        .insert(REQUEST_ID_HEADER, http::HeaderValue::from_static(id));
    let response = kernel.handle(req).await.unwrap();

    assert_eq!(response.headers()[REQUEST_ID_HEADER], id);
}

#[tokio::test]
async fn test_error_response_carries_the_hook_request_id() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let recorded = Arc::clone(&seen);

    let mut app = Application::new();
    app.hooks(KernelHooks::new().on_request(move |event| {
        recorded.lock().unwrap().push(event.request_id().to_string());
    }));
    let kernel = app.build().unwrap();

    let response = kernel.handle(request(Method::GET, "/nowhere")).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        response.headers()[REQUEST_ID_HEADER],
        seen.lock().unwrap()[0].as_str()
    );
}

#[tokio::test]
async fn test_hooks_can_answer_before_dispatch() {
    let mut app = Application::new();
    app.hooks(KernelHooks::new().on_request(|event| {
        if event.request().path() == "/maintenance" {
            event.set_response(Response::text(StatusCode::SERVICE_UNAVAILABLE, "later"));
        }
    }));
    let kernel = app.build().unwrap();

    let response = kernel
        .handle(request(Method::GET, "/maintenance"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(text(&response), "later");
}

#[tokio::test(start_paused = true)]
async fn test_request_deadline_uses_configured_status() {
    let mut config = FratilyConfig::default();
    config.server.request_timeout_secs = 1;
    config.server.timeout_status = 503;

    let mut app = Application::with_config(config);
    app.get(
        "/slow",
        Action::new("slow", [], |_| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            FaultResult::Ok("late")
        }),
    )
    .unwrap();
    let kernel = app.build().unwrap();

    let response = kernel.handle(request(Method::GET, "/slow")).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[test]
fn test_into_server_uses_server_section() {
    let mut config = FratilyConfig::production();
    config.server.http_addr = "127.0.0.1:0".to_string();
    config.server.max_body_bytes = 1024;

    let server = Application::with_config(config).into_server().unwrap();
    assert_eq!(server.config().http_addr(), "127.0.0.1:0");
    assert_eq!(server.config().max_body_bytes(), 1024);
    assert_eq!(server.kernel().deadline(), Some(Duration::from_secs(30)));
}
