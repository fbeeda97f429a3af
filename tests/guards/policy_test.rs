/*!
 * Policy Authority Tests
 * Policy chains driving the guards end to end
 */

use crate::support::{args, context, context_with, dict, ints};
use guarded_exec::authority::{
    AccessCheck, AttributeNamePolicy, FnPolicy, GuardCheck, PermissionGrantPolicy, PolicyDecision,
    ScalarValuePolicy,
};
use guarded_exec::{
    guarded_getattr, guarded_iter, guarded_sum, DenyAllAuthority, GuardConfig, GuardError, OverrideTable,
    PolicyAuthority, Sandbox, Value,
};
use pretty_assertions::assert_eq;
use std::sync::Arc;

/// Allows plain data, refuses ints above `limit`
fn bounded_ints(limit: i64) -> PolicyAuthority {
    PolicyAuthority::new("bounded")
        .with_policy(FnPolicy::new("int_limit", move |check: &AccessCheck<'_>| match check {
            AccessCheck::Value(Value::Int(i)) if *i > limit => PolicyDecision::Deny,
            _ => PolicyDecision::Abstain,
        }))
        .with_policy(ScalarValuePolicy)
}

#[test]
fn test_policy_chain_governs_aggregates() {
    let ctx = context();
    ctx.bind(Arc::new(bounded_ints(10)));

    assert_eq!(guarded_sum(&ctx, &ints(&[1, 2, 3]), None).unwrap(), Value::Int(6));

    let err = guarded_sum(&ctx, &ints(&[1, 20]), None).unwrap_err();
    match err {
        GuardError::Denied { reason, .. } => assert_eq!(reason, "denied by policy 'int_limit'"),
        other => panic!("expected denial, got {:?}", other),
    }
}

#[test]
fn test_policy_chain_governs_iteration() {
    let ctx = context();
    ctx.bind(Arc::new(bounded_ints(5)));

    let Value::Iter(it) = guarded_iter(&ctx, &ints(&[4, 5, 6])).unwrap() else {
        panic!("expected iterator");
    };
    assert_eq!(it.next().unwrap().unwrap(), Value::Int(4));
    assert_eq!(it.next().unwrap().unwrap(), Value::Int(5));
    assert!(it.next().unwrap().unwrap_err().is_denied());
    assert!(it.next().is_none());
}

#[test]
fn test_attribute_names_policy() {
    let ctx = context_with(OverrideTable::new());
    let authority = PolicyAuthority::new("names")
        .with_policy(AttributeNamePolicy::new().allow("upper").deny("split"));
    ctx.bind(Arc::new(authority));
    let text = Value::str("hello");

    let upper = guarded_getattr(&ctx, &text, "upper").unwrap();
    assert_eq!(upper.call(args([])).unwrap(), Value::str("HELLO"));

    match guarded_getattr(&ctx, &text, "split").unwrap_err() {
        GuardError::Denied { subject, reason } => {
            assert_eq!(subject, "split");
            assert_eq!(reason, "denied by policy 'attribute_names'");
        }
        other => panic!("expected denial, got {:?}", other),
    }
    assert!(guarded_getattr(&ctx, &text, "lower").unwrap_err().is_denied());
    // a missing attribute is an AttributeError before any policy runs
    assert!(guarded_getattr(&ctx, &dict(&[]), "nope").unwrap_err().is_native());
}

#[test]
fn test_abstaining_chain_denies() {
    let ctx = context();
    ctx.bind(Arc::new(PolicyAuthority::new("empty")));

    let err = guarded_sum(&ctx, &ints(&[1]), None).unwrap_err();
    match err {
        GuardError::Denied { reason, .. } => assert_eq!(reason, "no policy allowed this access"),
        other => panic!("expected denial, got {:?}", other),
    }
}

#[test]
fn test_permission_grants() {
    let ctx = context();
    ctx.bind(Arc::new(
        PolicyAuthority::new("grants").with_policy(PermissionGrantPolicy::new(["View", "Access contents"])),
    ));

    assert!(ctx.check_permission("View", &Value::None).unwrap());
    assert!(!ctx.check_permission("Manage portal", &Value::None).unwrap());

    ctx.unbind();
    assert!(ctx.check_permission("View", &Value::None).unwrap_err().is_unavailable());
}

#[test]
fn test_sandbox_audits_policy_denials() {
    let sandbox = Sandbox::new(GuardConfig::default());
    let ctx = sandbox.context();

    let err = sandbox
        .run_unit(&ctx, Arc::new(bounded_ints(1)), |ctx, ns| {
            ns.call("max", args([ints(&[0, 1])]))?;
            guarded_sum(ctx, &ints(&[2]), None)
        })
        .unwrap_err();
    assert!(err.is_denied());

    let audit = sandbox.audit().unwrap();
    assert_eq!(audit.denial_count(ctx.id()), 1);
    let events = audit.for_context(ctx.id(), 10);
    // approvals are not kept by default
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].check, GuardCheck::Value);
    assert_eq!(events[0].authority.as_deref(), Some("bounded"));
    assert!(!events[0].allowed);
}

#[test]
fn test_sandbox_audit_everything() {
    let sandbox = Sandbox::new(GuardConfig::audit_everything());
    let ctx = sandbox.context();

    sandbox
        .run_unit(&ctx, Arc::new(bounded_ints(10)), |ctx, _| guarded_sum(ctx, &ints(&[1, 2]), None))
        .unwrap();

    let audit = sandbox.audit().unwrap();
    assert_eq!(audit.for_context(ctx.id(), 10).len(), 2);
    assert_eq!(audit.denial_count(ctx.id()), 0);
}

#[test]
fn test_sandbox_deny_all() {
    let sandbox = Sandbox::new(GuardConfig::unaudited());
    let ctx = sandbox.context();
    assert!(sandbox.audit().is_none());

    let err = sandbox
        .run_unit(&ctx, Arc::new(DenyAllAuthority), |_, ns| ns.call("sorted", args([ints(&[3, 1])])))
        .unwrap_err();
    assert!(err.is_denied());
    assert!(!sandbox.registry().is_bound(ctx.id()));
}
