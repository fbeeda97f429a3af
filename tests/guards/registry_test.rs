/*!
 * Authority Registry Tests
 * Binding discipline, isolation and scoped release
 */

use crate::support::{add_ab, args, context, dict, ints, RecordingAuthority};
use guarded_exec::authority::AuditLogger;
use guarded_exec::{
    guard_mapping_get, guard_sequence_pop, guarded_apply, guarded_enumerate, guarded_getattr, guarded_min,
    guarded_sum, run_unit, AuthorityRegistry, DenyAllAuthority, ExecutionContext, Function, GuardError,
    OverrideTable, PermissiveAuthority, SafeNamespace, Sandbox, Value,
};
use pretty_assertions::assert_eq;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::thread;

#[test]
fn test_unit_of_work_leaves_no_binding_on_success() {
    let ctx = context();
    let result: Result<i32, GuardError> = run_unit(&ctx, Arc::new(PermissiveAuthority), |inner| {
        inner.validate_value(&Value::Int(1))?;
        Ok(1)
    });

    assert_eq!(result.unwrap(), 1);
    assert!(ctx.current().err().unwrap().is_unavailable());
}

#[test]
fn test_unit_of_work_leaves_no_binding_on_failure() {
    let ctx = context();
    let result: Result<(), GuardError> = run_unit(&ctx, Arc::new(DenyAllAuthority), |inner| {
        inner.validate_value(&Value::Int(1))
    });

    assert!(result.unwrap_err().is_denied());
    assert!(ctx.current().err().unwrap().is_unavailable());
}

#[test]
fn test_unit_of_work_leaves_no_binding_on_panic() {
    let ctx = context();
    let inner_ctx = ctx.clone();

    let outcome = std::panic::catch_unwind(AssertUnwindSafe(move || {
        let _: Result<(), GuardError> = run_unit(&inner_ctx, Arc::new(PermissiveAuthority), |_| {
            panic!("restricted code blew up");
        });
    }));

    assert!(outcome.is_err());
    assert!(ctx.current().is_err());
}

#[test]
fn test_guards_fail_safe_without_authority() {
    let ctx = context();
    let err = ctx.validate_value(&Value::Int(1)).unwrap_err();
    assert!(err.is_unavailable());
    assert_eq!(err.http_status(), 500);
}

#[test]
fn test_later_binding_governs() {
    let ctx = context();
    let first = RecordingAuthority::accepting();
    let second = RecordingAuthority::rejecting();

    ctx.bind(first.clone());
    let get = guard_mapping_get(&ctx, &dict(&[("a", Value::Int(1))]), "get").unwrap();
    ctx.bind(second.clone());

    let err = get.call(args([Value::str("a")])).unwrap_err();
    assert!(err.is_denied());
    assert_eq!(first.call_count(), 0);
    assert_eq!(second.call_count(), 1);
}

#[test]
fn test_bindings_are_isolated_across_threads() {
    let registry = Arc::new(AuthorityRegistry::new());
    let overrides = Arc::new(OverrideTable::new());

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let ctx = registry.context(Arc::clone(&overrides));
            thread::spawn(move || {
                let permissive = i % 2 == 0;
                for _ in 0..100 {
                    let result: Result<(), GuardError> = if permissive {
                        run_unit(&ctx, Arc::new(PermissiveAuthority), |c| c.validate_value(&Value::Int(i)))
                    } else {
                        run_unit(&ctx, Arc::new(DenyAllAuthority), |c| c.validate_value(&Value::Int(i)))
                    };
                    assert_eq!(result.is_ok(), permissive);
                }
                ctx.current().is_err()
            })
        })
        .collect();

    for handle in handles {
        assert!(handle.join().unwrap());
    }
    assert_eq!(registry.bound_contexts(), 0);
}

#[test]
fn test_audit_trail_records_denials() {
    let audit = Arc::new(AuditLogger::new(64, false));
    let registry = Arc::new(AuthorityRegistry::with_audit(Arc::clone(&audit)));
    let ctx = registry.context(Arc::new(OverrideTable::new()));

    ctx.bind(Arc::new(DenyAllAuthority));
    let _ = ctx.validate_value(&Value::Int(1));
    let _ = ctx.validate_value(&Value::Int(2));
    ctx.bind(Arc::new(PermissiveAuthority));
    let _ = ctx.validate_value(&Value::Int(3));

    assert_eq!(audit.denial_count(ctx.id()), 2);
    let events = audit.for_context(ctx.id(), 10);
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].authority.as_deref(), Some("deny_all"));
}

#[test]
fn test_every_guard_fails_safe_without_authority() {
    let ctx = context();
    let d = dict(&[("a", Value::Int(1))]);
    let l = ints(&[1, 2]);
    let func = Value::from(Function::new("f", |_| Ok(Value::None)).with_attr("x", Value::None));

    assert!(guarded_getattr(&ctx, &func, "x").unwrap_err().is_unavailable());

    let get = guard_mapping_get(&ctx, &d, "get").unwrap();
    assert!(get.call(args([Value::str("a")])).unwrap_err().is_unavailable());
    let pop = guard_sequence_pop(&ctx, &l, "pop").unwrap();
    assert!(pop.call(args([])).unwrap_err().is_unavailable());

    assert!(guarded_sum(&ctx, &l, None).unwrap_err().is_unavailable());
    assert!(guarded_min(&ctx, &args([l.clone()])).unwrap_err().is_unavailable());
    let mut pairs = guarded_enumerate(&ctx, &l, 0).unwrap();
    assert!(pairs.next().unwrap().unwrap_err().is_unavailable());
    assert!(guarded_apply(&ctx, &add_ab(), args([Value::Int(1)])).unwrap_err().is_unavailable());
}

#[test]
fn test_public_handles_are_send_and_sync() {
    fn assert_send_sync<T: Send + Sync>() {}

    assert_send_sync::<ExecutionContext>();
    assert_send_sync::<AuthorityRegistry>();
    assert_send_sync::<OverrideTable>();
    assert_send_sync::<SafeNamespace>();
    assert_send_sync::<Sandbox>();
    assert_send_sync::<Value>();
    assert_send_sync::<GuardError>();
}
