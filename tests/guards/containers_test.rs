/*!
 * Container Guard Tests
 * Guarded get, pop and iteration over dicts and lists
 */

use crate::support::{args, bound, dict, ints, Call, RecordingAuthority};
use guarded_exec::guards::guard_named_iteration;
use guarded_exec::{
    guard_mapping_get, guard_mapping_pop, guard_sequence_pop, guarded_getattr, GuardResult, NativeError, Value,
};
use pretty_assertions::assert_eq;

fn drain(iterator: &Value) -> Vec<GuardResult<Value>> {
    let Value::Iter(it) = iterator else {
        panic!("expected an iterator, got {:?}", iterator);
    };
    std::iter::from_fn(|| it.next()).collect()
}

fn sorted(mut values: Vec<Value>) -> Vec<Value> {
    values.sort_by(|a, b| a.compare(b).unwrap());
    values
}

#[test]
fn test_get_simple() {
    let ctx = bound(RecordingAuthority::accepting());
    let get = guard_mapping_get(&ctx, &dict(&[("foo", Value::str("bar"))]), "get").unwrap();
    assert_eq!(get.call(args([Value::str("foo")])).unwrap(), Value::str("bar"));
}

#[test]
fn test_get_default() {
    let authority = RecordingAuthority::accepting();
    let ctx = bound(authority.clone());
    let get = guard_mapping_get(&ctx, &dict(&[("foo", Value::str("bar"))]), "get").unwrap();

    assert_eq!(get.call(args([Value::str("baz")])).unwrap(), Value::None);
    assert_eq!(get.call(args([Value::str("baz"), Value::str("splat")])).unwrap(), Value::str("splat"));
    assert_eq!(authority.call_count(), 0);
}

#[test]
fn test_get_validates() {
    let authority = RecordingAuthority::rejecting();
    let ctx = bound(authority.clone());
    let get = guard_mapping_get(&ctx, &dict(&[("foo", Value::Int(1))]), "get").unwrap();

    assert!(get.call(args([Value::str("foo")])).unwrap_err().is_denied());
    assert_eq!(authority.calls(), vec![Call::ValidateValue(Value::Int(1))]);
}

#[test]
fn test_pop_simple() {
    let ctx = bound(RecordingAuthority::accepting());
    let pop = guard_mapping_pop(&ctx, &dict(&[("foo", Value::str("bar"))]), "pop").unwrap();
    assert_eq!(pop.call(args([Value::str("foo")])).unwrap(), Value::str("bar"));
}

#[test]
fn test_pop_raises() {
    let authority = RecordingAuthority::accepting();
    let ctx = bound(authority.clone());
    let pop = guard_mapping_pop(&ctx, &dict(&[("foo", Value::str("bar"))]), "pop").unwrap();

    let err = pop.call(args([Value::str("baz")])).unwrap_err();
    assert!(matches!(err.native(), Some(NativeError::Key(_))));
    assert_eq!(authority.call_count(), 0);
}

#[test]
fn test_pop_default() {
    let ctx = bound(RecordingAuthority::accepting());
    let pop = guard_mapping_pop(&ctx, &dict(&[("foo", Value::str("bar"))]), "pop").unwrap();
    assert_eq!(pop.call(args([Value::str("baz"), Value::str("splat")])).unwrap(), Value::str("splat"));
}

#[test]
fn test_denied_pop_mutation_stands() {
    let ctx = bound(RecordingAuthority::rejecting());
    let d = dict(&[("foo", Value::str("bar")), ("keep", Value::Int(1))]);
    let pop = guard_mapping_pop(&ctx, &d, "pop").unwrap();

    assert!(pop.call(args([Value::str("foo")])).unwrap_err().is_denied());
    let remaining = d.as_dict().unwrap();
    assert_eq!(remaining.len(), 1);
    assert!(!remaining.contains(&Value::str("foo")).unwrap());
}

#[test]
fn test_list_pop_simple() {
    let ctx = bound(RecordingAuthority::accepting());
    let l = Value::list([Value::str("foo"), Value::str("bar"), Value::str("baz")]);
    let pop = guard_sequence_pop(&ctx, &l, "pop").unwrap();

    assert_eq!(pop.call(args([])).unwrap(), Value::str("baz"));
    assert_eq!(pop.call(args([Value::Int(0)])).unwrap(), Value::str("foo"));
}

#[test]
fn test_list_pop_raises() {
    let authority = RecordingAuthority::accepting();
    let ctx = bound(authority.clone());
    let pop = guard_sequence_pop(&ctx, &ints(&[]), "pop").unwrap();

    let err = pop.call(args([])).unwrap_err();
    assert!(matches!(err.native(), Some(NativeError::Index(_))));
    assert_eq!(authority.call_count(), 0);
}

#[test]
fn test_list_pop_validates() {
    let authority = RecordingAuthority::rejecting();
    let ctx = bound(authority.clone());
    let l = ints(&[7]);
    let pop = guard_sequence_pop(&ctx, &l, "pop").unwrap();

    assert!(pop.call(args([])).unwrap_err().is_denied());
    assert_eq!(authority.calls(), vec![Call::ValidateValue(Value::Int(7))]);
    assert_eq!(l, ints(&[]));
}

#[test]
fn test_iterkeys_simple() {
    let ctx = bound(RecordingAuthority::accepting());
    let d = dict(&[("foo", Value::Int(1)), ("bar", Value::Int(2)), ("baz", Value::Int(3))]);
    let iterkeys = guard_named_iteration(&ctx, &d, "iterkeys").unwrap();

    let keys: Vec<Value> = drain(&iterkeys.call(args([])).unwrap())
        .into_iter()
        .collect::<GuardResult<_>>()
        .unwrap();
    assert_eq!(sorted(keys), sorted(d.as_dict().unwrap().keys()));
}

#[test]
fn test_itervalues_simple() {
    let ctx = bound(RecordingAuthority::accepting());
    let d = dict(&[("foo", Value::Int(1)), ("bar", Value::Int(2)), ("baz", Value::Int(2))]);
    let itervalues = guard_named_iteration(&ctx, &d, "itervalues").unwrap();

    let values: Vec<Value> = drain(&itervalues.call(args([])).unwrap())
        .into_iter()
        .collect::<GuardResult<_>>()
        .unwrap();
    assert_eq!(sorted(values), ints(&[1, 2, 2]).as_list().unwrap().snapshot());
}

#[test]
fn test_iteration_empty() {
    let authority = RecordingAuthority::rejecting();
    let ctx = bound(authority.clone());
    for name in ["iterkeys", "itervalues", "iteritems"] {
        let iterate = guard_named_iteration(&ctx, &dict(&[]), name).unwrap();
        assert!(drain(&iterate.call(args([])).unwrap()).is_empty());
    }
    assert_eq!(authority.call_count(), 0);
}

#[test]
fn test_iterkeys_validates() {
    let authority = RecordingAuthority::rejecting();
    let ctx = bound(authority.clone());
    let iterkeys = guard_named_iteration(&ctx, &dict(&[("secret", Value::Int(1))]), "iterkeys").unwrap();

    let results = drain(&iterkeys.call(args([])).unwrap());
    assert_eq!(results.len(), 1);
    assert!(results[0].as_ref().unwrap_err().is_denied());
    assert_eq!(authority.calls(), vec![Call::ValidateValue(Value::str("secret"))]);
}

#[test]
fn test_itervalues_validates_lazily() {
    let authority = RecordingAuthority::rejecting_values(|v| *v == Value::Int(2));
    let ctx = bound(authority.clone());
    let d = dict(&[("a", Value::Int(1)), ("b", Value::Int(2)), ("c", Value::Int(3))]);
    let itervalues = guard_named_iteration(&ctx, &d, "itervalues").unwrap();

    let iterator = itervalues.call(args([])).unwrap();
    assert_eq!(authority.call_count(), 0);

    let results = drain(&iterator);
    let denied_at = results.iter().position(|r| r.is_err()).unwrap();
    // the denial is the last thing produced
    assert_eq!(denied_at, results.len() - 1);
    assert_eq!(authority.call_count(), results.len());
}

#[test]
fn test_iteritems_yield_pairs() {
    let ctx = bound(RecordingAuthority::accepting());
    let iteritems = guard_named_iteration(&ctx, &dict(&[("a", Value::Int(1))]), "iteritems").unwrap();
    let items: Vec<Value> = drain(&iteritems.call(args([])).unwrap())
        .into_iter()
        .collect::<GuardResult<_>>()
        .unwrap();
    assert_eq!(items, vec![Value::tuple([Value::str("a"), Value::Int(1)])]);

    // a key refused through keys() stays refused through items()
    let ctx = bound(RecordingAuthority::rejecting_values(|v| *v == Value::str("secret")));
    let d = dict(&[("secret", Value::Int(1))]);
    for name in ["keys", "items", "iteritems"] {
        let iterate = guarded_getattr(&ctx, &d, name).unwrap();
        let results = drain(&iterate.call(args([])).unwrap());
        assert_eq!(results.len(), 1, "{}", name);
        assert!(results[0].as_ref().unwrap_err().is_denied(), "{}", name);
    }
}

#[test]
fn test_setdefault_is_guarded() {
    let ctx = bound(RecordingAuthority::rejecting_values(|v| *v == Value::str("hidden")));
    let d = dict(&[("k", Value::str("hidden"))]);

    let get = guarded_getattr(&ctx, &d, "get").unwrap();
    assert!(get.call(args([Value::str("k")])).unwrap_err().is_denied());
    let setdefault = guarded_getattr(&ctx, &d, "setdefault").unwrap();
    assert!(setdefault.call(args([Value::str("k")])).unwrap_err().is_denied());

    // an absent key inserts the caller's default and hands it back
    let inserted = setdefault.call(args([Value::str("n"), Value::Int(5)])).unwrap();
    assert_eq!(inserted, Value::Int(5));
    assert_eq!(d.as_dict().unwrap().get(&Value::str("n")).unwrap(), Some(Value::Int(5)));
}

#[test]
fn test_iteration_is_restartable_over_dicts() {
    let ctx = bound(RecordingAuthority::accepting());
    let iterkeys = guard_named_iteration(&ctx, &dict(&[("a", Value::Int(1))]), "iterkeys").unwrap();
    assert_eq!(drain(&iterkeys.call(args([])).unwrap()).len(), 1);
    assert_eq!(drain(&iterkeys.call(args([])).unwrap()).len(), 1);
}
