mod common;

use common::{record, Recorder};
use std::sync::Arc;
use trellis::controller::{route_map, Controller, RouteMapBuilder};
use trellis::error::ServerError;
use trellis::handler::fallible;
use trellis::http::{HttpException, Method, Request, Response};
use trellis::middleware::GlobalHooks;
use trellis::pipeline::{stages_for, StagePhase};
use trellis::Server;

struct Ordered;

impl Controller for Ordered {
    fn define(routes: &mut RouteMapBuilder<Self>) {
        routes
            .before_all(record("b1"))
            .before_all(record("b2"))
            .before("index", record("b3"))
            .action("index", Method::GET, "/ordered", |_c: Arc<Ordered>, req: Request, res: Response| {
                record("h")(req, res)
            })
            .after("index", record("b4"))
            .after_all(record("b5"));
    }
}

struct Guarded;

impl Controller for Guarded {
    fn define(routes: &mut RouteMapBuilder<Self>) {
        routes
            .action("show", Method::GET, "/guarded", |_c: Arc<Guarded>, req: Request, res: Response| {
                record("h")(req, res)
            })
            .before("show", record("seen"))
            .before("show", |_req: Request, mut res: Response| {
                res.status(401).send("denied");
                res
            })
            .before("show", record("after-guard"))
            .after("show", record("after"))
            .after_all(record("after-all"));
    }
}

struct Mixed;

impl Controller for Mixed {
    fn define(routes: &mut RouteMapBuilder<Self>) {
        routes
            .before("index", |req: Request, res: Response| async move {
                tokio::task::yield_now().await;
                req.set_data("async", true);
                res
            })
            .before("index", |req: Request, res: Response| {
                req.set_data("sync", "yes");
                res
            })
            .before("index", |_req: Request, mut res: Response| async move {
                res.header("X-Checked", "1");
                Ok::<Response, ServerError>(res)
            })
            .action("index", Method::GET, "/mixed", |_c: Arc<Mixed>, req: Request, mut res: Response| {
                let flag = req.get_typed_data::<bool>("async").unwrap_or(false);
                let sync = req.get_typed_data::<String>("sync").unwrap_or_default();
                res.body(format!("{} {}", flag, sync));
                res
            });
    }
}

struct Failing;

impl Controller for Failing {
    fn define(routes: &mut RouteMapBuilder<Self>) {
        routes
            .action("secret", Method::GET, "/secret", |_c: Arc<Failing>, _req: Request, _res: Response| async {
                Err::<Response, _>(ServerError::from(HttpException::forbidden("no access")))
            })
            .after("secret", record("after"));
    }
}

struct Bare;

impl Controller for Bare {
    fn define(routes: &mut RouteMapBuilder<Self>) {
        routes.action("ping", Method::GET, "/ping", |_c: Arc<Bare>, req: Request, res: Response| {
            record("h")(req, res)
        });
    }
}

struct Gated;

impl Controller for Gated {
    fn define(routes: &mut RouteMapBuilder<Self>) {
        routes
            .before("admin", record("seen"))
            .before(
                "admin",
                fallible(|req: Request, res: Response| {
                    if req.get_header("authorization").is_some() {
                        Ok(res)
                    } else {
                        Err(HttpException::forbidden("admins only").into())
                    }
                }),
            )
            .action("admin", Method::GET, "/admin", |_c: Arc<Gated>, req: Request, res: Response| {
                record("h")(req, res)
            })
            .after("admin", record("after"));
    }
}

fn server_with(recorder: &Arc<Recorder>) -> Server {
    let mut server = Server::new();
    server.services(Arc::clone(recorder)).unwrap();
    server
}

#[tokio::test]
async fn stages_run_in_declared_order() {
    let recorder = Recorder::shared();
    let mut server = server_with(&recorder);
    server.register_routes(Ordered).unwrap();

    let res = server.dispatch(Request::new(Method::GET, "/ordered")).await;

    assert_eq!(res.status, 200);
    assert_eq!(recorder.names(), ["b1", "b2", "b3", "h", "b4", "b5"]);
}

#[tokio::test]
async fn framework_hooks_wrap_controller_hooks() {
    let recorder = Recorder::shared();
    let mut server = server_with(&recorder);
    server.before_all(record("g1")).unwrap();
    server.after_all(record("g2")).unwrap();
    server.register_routes(Ordered).unwrap();

    server.dispatch(Request::new(Method::GET, "/ordered")).await;

    assert_eq!(recorder.names(), ["g1", "b1", "b2", "b3", "h", "b4", "b5", "g2"]);
}

#[tokio::test]
async fn compiling_twice_yields_the_same_order() {
    let map = route_map::<Ordered>();
    let controller = Arc::new(Ordered);
    let globals = GlobalHooks::new();

    let labels = |stages: Vec<trellis::pipeline::Stage>| -> Vec<(StagePhase, String)> {
        stages.into_iter().map(|stage| (stage.phase, stage.label)).collect()
    };
    let first = labels(stages_for(&controller, &*map, &globals, "index").unwrap());
    let second = labels(stages_for(&controller, &*map, &globals, "index").unwrap());

    assert_eq!(first.len(), 6);
    assert_eq!(first, second);
    assert_eq!(first[3].0, StagePhase::Handler);

    for _ in 0..2 {
        let recorder = Recorder::shared();
        let mut server = server_with(&recorder);
        server.register_routes(Ordered).unwrap();
        server.dispatch(Request::new(Method::GET, "/ordered")).await;
        assert_eq!(recorder.names(), ["b1", "b2", "b3", "h", "b4", "b5"]);
    }
}

#[tokio::test]
async fn finalized_response_short_circuits_the_chain() {
    let recorder = Recorder::shared();
    let mut server = server_with(&recorder);
    server.after_all(record("global-after")).unwrap();
    server.register_routes(Guarded).unwrap();

    let res = server.dispatch(Request::new(Method::GET, "/guarded")).await;

    assert_eq!(res.status, 401);
    assert_eq!(res.body, "denied");
    assert!(res.is_finalized());
    assert_eq!(recorder.names(), ["seen"]);
}

#[tokio::test]
async fn sync_and_async_hooks_share_request_data() {
    let mut server = Server::new();
    server.register_routes(Mixed).unwrap();

    let res = server.dispatch(Request::new(Method::GET, "/mixed")).await;

    assert_eq!(res.status, 200);
    assert_eq!(res.body, "true yes");
    assert_eq!(res.headers.get("X-Checked").map(String::as_str), Some("1"));
}

#[tokio::test]
async fn handler_errors_skip_later_stages() {
    let recorder = Recorder::shared();
    let mut server = server_with(&recorder);
    server.register_routes(Failing).unwrap();

    let route = server.routes().by_method_name("secret").unwrap();
    let err = route
        .call(Request::new(Method::GET, "/secret"), Response::default())
        .await
        .unwrap_err();
    assert_eq!(err.as_http(), Some(&HttpException::forbidden("no access")));
    assert!(recorder.names().is_empty());

    let res = server.dispatch(Request::new(Method::GET, "/secret")).await;
    assert_eq!(res.status, 403);
    let body: serde_json::Value = serde_json::from_str(&res.body).unwrap();
    assert_eq!(body["error"]["name"], "ForbiddenException");
    assert_eq!(body["error"]["message"], "no access");
}

#[tokio::test]
async fn global_hooks_run_for_routes_without_local_hooks() {
    let recorder = Recorder::shared();
    let mut server = server_with(&recorder);
    server.before_all(record("g1")).unwrap();
    server.after_all(record("g2")).unwrap();
    server.register_routes(Bare).unwrap();

    let res = server.dispatch(Request::new(Method::GET, "/ping")).await;

    assert_eq!(res.status, 200);
    assert_eq!(recorder.names(), ["g1", "h", "g2"]);
}

#[tokio::test]
async fn sync_fallible_hook_aborts_the_chain() {
    let recorder = Recorder::shared();
    let mut server = server_with(&recorder);
    server.register_routes(Gated).unwrap();

    let res = server.dispatch(Request::new(Method::GET, "/admin")).await;
    assert_eq!(res.status, 403);
    assert_eq!(recorder.names(), ["seen"]);

    let res = server
        .dispatch(Request::new(Method::GET, "/admin").with_header("Authorization", "Bearer t"))
        .await;
    assert_eq!(res.status, 200);
    assert_eq!(recorder.names(), ["seen", "seen", "h", "after"]);
}
