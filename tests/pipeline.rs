//! End-to-end scenarios exercising the full
//! Loader → Compiler → ExecutableUnit → Evaluator pipeline.

use std::collections::BTreeMap;
use std::time::Duration;

use polyscript_core::compiler::{Compiler, CompilerOptions, ConfigCompiler, ExprCompiler};
use polyscript_core::context::EvalContext;
use polyscript_core::error::{CompileError, LoaderError};
use polyscript_core::evaluator::{ConfigEvaluator, Evaluator, ExprEvaluator};
use polyscript_core::provider::DataProvider;
use polyscript_core::source::{HttpLoaderOptions, Loader, SourceRef};
use polyscript_core::unit::ExecutableUnit;
use polyscript_core::value::{TypeTag, Value};

fn static_bundle(pairs: &[(&str, Value)]) -> BTreeMap<String, Value> {
    pairs.iter().cloned().map(|(k, v)| (k.to_string(), v)).collect()
}

#[tokio::test]
async fn greeting_via_expression_engine() {
    let compiler = ExprCompiler::new(CompilerOptions::new());
    let loader =
        Loader::from_string(r#"let name = ctx["name"]; "Hello, " + name + ".""#).unwrap();
    let static_data = static_bundle(&[("name", Value::String("World".into()))]);

    let unit = ExecutableUnit::build(None, loader, &compiler, None, Some(static_data))
        .await
        .unwrap();

    let evaluator = ExprEvaluator::new();
    let result = evaluator.eval(&unit, EvalContext::new()).await.unwrap();

    assert_eq!(result.value, Value::String("Hello, World.".into()));
    assert_eq!(result.type_tag, TypeTag::String);
}

#[tokio::test]
async fn greeting_with_dynamic_override() {
    let compiler = ExprCompiler::new(CompilerOptions::new());
    let loader =
        Loader::from_string(r#"let name = ctx["name"]; "Hello, " + name + ".""#).unwrap();
    let static_data = static_bundle(&[
        ("name", Value::String("User".into())),
        ("excited", Value::Bool(true)),
    ]);
    let dynamic_provider = DataProvider::context(polyscript_core::context::EVAL_DATA_KEY);

    let unit = ExecutableUnit::build(
        None,
        loader,
        &compiler,
        Some(dynamic_provider),
        Some(static_data),
    )
    .await
    .unwrap();

    let mut dynamic = BTreeMap::new();
    dynamic.insert("name".to_string(), Value::String("Robert".into()));
    let ctx = EvalContext::new();
    // The composite's static child always rejects `add`; the context child
    // still lands its data, so the returned context is used regardless of
    // the partial-failure result (spec §4.5 `prepare` semantics).
    let (ctx, _partial) = unit.prepare(ctx, vec![Value::Map(dynamic)]).await;

    let evaluator = ExprEvaluator::new();
    let result = evaluator.eval(&unit, ctx).await.unwrap();
    assert_eq!(result.value, Value::String("Hello, Robert.".into()));
}

#[tokio::test]
async fn config_engine_map_return() {
    let compiler = ConfigCompiler::new(CompilerOptions::new());
    let loader =
        Loader::from_string("_ = {\"greeting\": \"Hello, World!\", \"length\": 13}\n").unwrap();
    let unit = ExecutableUnit::build(None, loader, &compiler, None, None)
        .await
        .unwrap();

    let evaluator = ConfigEvaluator::new();
    let result = evaluator.eval(&unit, EvalContext::new()).await.unwrap();

    assert_eq!(result.type_tag, TypeTag::Map);
    let Value::Map(m) = result.value else {
        panic!("expected map")
    };
    assert_eq!(m.get("greeting"), Some(&Value::String("Hello, World!".into())));
    assert_eq!(m.get("length"), Some(&Value::Int(13)));
}

#[tokio::test]
async fn config_engine_callable_is_invoked_and_frozen() {
    let compiler = ConfigCompiler::new(CompilerOptions::new());
    let loader = Loader::from_string("def f():\n    return 42\n_ = f\n").unwrap();
    let unit = ExecutableUnit::build(None, loader, &compiler, None, None)
        .await
        .unwrap();

    let evaluator = ConfigEvaluator::new();
    let result = evaluator.eval(&unit, EvalContext::new()).await.unwrap();

    assert_eq!(result.value, Value::Int(42));
    assert_eq!(result.type_tag, TypeTag::Int);
}

#[tokio::test]
async fn cancellation_during_busy_loop_is_reported() {
    let compiler = ExprCompiler::new(CompilerOptions::new());
    let loader = Loader::from_string("let x = 0; while x < 20000000 { x += 1; } x").unwrap();
    let unit = ExecutableUnit::build(None, loader, &compiler, None, None)
        .await
        .unwrap();

    let ctx = EvalContext::new();
    let cancel_ctx = ctx.clone();
    // `ExprEvaluator::eval` runs the busy loop on the blocking-task pool, not
    // this runtime's async worker, so this spawned task is free to run
    // concurrently with it even on the default current-thread test runtime.
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(10)).await;
        cancel_ctx.cancel();
    });

    let evaluator = ExprEvaluator::new();
    let err = evaluator.eval(&unit, ctx).await.unwrap_err();
    assert!(matches!(
        err,
        polyscript_core::error::EvalError::Cancelled
    ));
}

#[tokio::test]
async fn undeclared_global_fails_compilation() {
    let compiler = ExprCompiler::new(CompilerOptions::new());
    let loader = Loader::from_string("greeting").unwrap();
    let err = ExecutableUnit::build(None, loader, &compiler, None, None)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        polyscript_core::error::UnitError::Compile(CompileError::ValidationFailed { .. })
    ));
}

#[tokio::test]
async fn declared_global_compiles_and_evaluates() {
    let compiler = ExprCompiler::new(CompilerOptions::new().with_globals(["greeting"]));
    let loader = Loader::from_string("greeting + \"!\"").unwrap();
    let static_data = static_bundle(&[("greeting", Value::String("hi".into()))]);
    let unit = ExecutableUnit::build(None, loader, &compiler, None, Some(static_data))
        .await
        .unwrap();

    let evaluator = ExprEvaluator::new();
    let result = evaluator.eval(&unit, EvalContext::new()).await.unwrap();
    assert_eq!(result.value, Value::String("hi!".into()));
}

#[tokio::test]
async fn http_loader_404_never_reaches_compile() {
    let server = wiremock::MockServer::start().await;
    wiremock::Mock::given(wiremock::matchers::method("GET"))
        .and(wiremock::matchers::path("/missing.rhai"))
        .respond_with(wiremock::ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let url = format!("{}/missing.rhai", server.uri());
    let loader = Loader::from_http(url, HttpLoaderOptions::default()).unwrap();

    let err = loader.open().await.unwrap_err();
    assert!(matches!(err, LoaderError::ScriptNotAvailable { status: 404 }));
}

#[tokio::test]
async fn empty_and_comment_only_scripts_reject_uniformly() {
    let expr = ExprCompiler::new(CompilerOptions::new());
    let config = ConfigCompiler::new(CompilerOptions::new());

    for source in ["", "   \n"] {
        let err = expr
            .compile(Box::new(std::io::Cursor::new(source.as_bytes().to_vec())))
            .unwrap_err();
        assert!(matches!(err, CompileError::NoInstructions));
    }

    for (compiler_name, err) in [
        (
            "expr",
            expr.compile(Box::new(std::io::Cursor::new(b"# just a comment\n".to_vec())))
                .unwrap_err(),
        ),
        (
            "config",
            config
                .compile(Box::new(std::io::Cursor::new(b"# just a comment\n".to_vec())))
                .unwrap_err(),
        ),
    ] {
        assert!(
            matches!(err, CompileError::NoInstructions),
            "{compiler_name} should reject comment-only source"
        );
    }
}
