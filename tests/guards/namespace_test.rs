/*!
 * Safe Namespace Tests
 * The names restricted code sees and how they behave
 */

use crate::support::{add_ab, args, bound, dict, ints, RecordingAuthority};
use guarded_exec::namespace::SAFE_NAMES;
use guarded_exec::{CallArgs, GuardConfig, NativeError, PermissiveAuthority, Sandbox, SafeNamespace, Value};
use pretty_assertions::assert_eq;
use std::sync::Arc;

fn namespace(authority: Arc<RecordingAuthority>) -> SafeNamespace {
    SafeNamespace::new(&bound(authority))
}

#[test]
fn test_exposes_exactly_the_safe_names() {
    let ns = namespace(RecordingAuthority::accepting());
    assert_eq!(ns.names(), SAFE_NAMES.to_vec());
    for hidden in ["open", "eval", "exec", "__import__", "type", "vars"] {
        assert!(ns.get(hidden).is_none(), "{} must not be exposed", hidden);
    }
}

#[test]
fn test_dict_creation() {
    let ns = namespace(RecordingAuthority::accepting());
    let one_two = dict(&[]);
    one_two.as_dict().unwrap().insert(Value::Int(1), Value::Int(2)).unwrap();

    assert_eq!(ns.call("dict", CallArgs::new()).unwrap(), dict(&[]));
    assert_eq!(ns.call("dict", args([one_two.clone()])).unwrap(), one_two);
    assert_eq!(
        ns.call("dict", args([Value::tuple([Value::tuple([Value::Int(1), Value::Int(2)])])]))
            .unwrap(),
        one_two
    );
    assert_eq!(
        ns.call("dict", CallArgs::new().with_keyword("foo", 1i64)).unwrap(),
        dict(&[("foo", Value::Int(1))])
    );
}

#[test]
fn test_dict_fromkeys() {
    let ns = namespace(RecordingAuthority::accepting());
    let fromkeys = ns.call("getattr", args([ns.get("dict").unwrap().clone(), Value::str("fromkeys")]));
    // dict is a function: no override entry, so the authority decides
    let fromkeys = fromkeys.unwrap();

    let keys = Value::tuple([Value::Int(1), Value::Int(2), Value::Int(3)]);
    let filled = fromkeys.call(args([keys.clone()])).unwrap();
    let d = filled.as_dict().unwrap();
    assert_eq!(d.len(), 3);
    assert_eq!(d.get(&Value::Int(2)).unwrap(), Some(Value::None));

    let filled = fromkeys.call(args([keys, Value::str("f")])).unwrap();
    assert_eq!(filled.as_dict().unwrap().get(&Value::Int(1)).unwrap(), Some(Value::str("f")));
}

#[test]
fn test_list_creation_and_sorted() {
    let ns = namespace(RecordingAuthority::accepting());
    let x = ints(&[3, 2, 1]);

    assert_eq!(ns.call("list", CallArgs::new()).unwrap(), ints(&[]));
    assert_eq!(ns.call("list", args([ints(&[1, 2, 3])])).unwrap(), ints(&[1, 2, 3]));
    assert_eq!(ns.call("list", args([x.clone()])).unwrap(), ints(&[3, 2, 1]));
    assert_eq!(ns.call("sorted", args([x])).unwrap(), ints(&[1, 2, 3]));
}

#[test]
fn test_pure_builtins_ignore_authority() {
    let authority = RecordingAuthority::rejecting();
    let ns = namespace(authority.clone());

    assert_eq!(ns.call("len", args([ints(&[1, 2])])).unwrap(), Value::Int(2));
    assert_eq!(ns.call("range", args([Value::Int(3)])).unwrap(), ints(&[0, 1, 2]));
    assert_eq!(ns.call("abs", args([Value::Int(-4)])).unwrap(), Value::Int(4));
    assert_eq!(ns.get("True"), Some(&Value::Bool(true)));
    assert_eq!(authority.call_count(), 0);
}

#[test]
fn test_guarded_builtins_consult_authority() {
    let ns = namespace(RecordingAuthority::rejecting());

    for name in ["min", "max", "sorted"] {
        assert!(ns.call(name, args([ints(&[1, 2])])).unwrap_err().is_denied(), "{}", name);
    }
    assert!(ns.call("sum", args([ints(&[1])])).unwrap_err().is_denied());
    assert!(ns.call("apply", args([add_ab(), ints(&[1])])).unwrap_err().is_denied());
    assert_eq!(ns.call("apply", args([add_ab()])).unwrap(), Value::Int(3));
}

#[test]
fn test_sum_start_keyword() {
    let ns = namespace(RecordingAuthority::accepting());
    let call = args([ints(&[1, 2, 3])]).with_keyword("start", 36i64);
    assert_eq!(ns.call("sum", call).unwrap(), Value::Int(42));
}

#[test]
fn test_iteration_entry_points() {
    let authority = RecordingAuthority::rejecting();
    let ns = namespace(authority.clone());

    let it = ns.call("_getiter_", args([ints(&[1])])).unwrap();
    // building the iterator exposes nothing
    assert_eq!(authority.call_count(), 0);
    let Value::Iter(it) = it else { panic!("expected iterator") };
    assert!(it.is_guarded());
    assert!(it.next().unwrap().unwrap_err().is_denied());

    let pairs = ns.call("enumerate", args([ints(&[5])])).unwrap();
    let Value::Iter(pairs) = pairs else { panic!("expected iterator") };
    assert!(pairs.next().unwrap().unwrap_err().is_denied());
}

#[test]
fn test_container_factories() {
    let ns = namespace(RecordingAuthority::accepting());
    let d = dict(&[("foo", Value::str("bar"))]);

    let get = ns.call("_get_dict_get_", args([d.clone(), Value::str("get")])).unwrap();
    assert_eq!(get.call(args([Value::str("foo")])).unwrap(), Value::str("bar"));

    let iterkeys = ns.call("_get_iter_", args([d.clone(), Value::str("iterkeys")])).unwrap();
    assert!(matches!(iterkeys.call(args([])).unwrap(), Value::Iter(_)));

    let pop = ns.call("_get_dict_pop_", args([d.clone(), Value::str("pop")])).unwrap();
    assert_eq!(pop.call(args([Value::str("foo")])).unwrap(), Value::str("bar"));
    assert!(d.as_dict().unwrap().is_empty());

    let list_pop = ns.call("_get_list_pop_", args([ints(&[4]), Value::str("pop")])).unwrap();
    assert_eq!(list_pop.call(args([])).unwrap(), Value::Int(4));
}

#[test]
fn test_getattr_through_namespace() {
    let ns = namespace(RecordingAuthority::accepting());
    let d = dict(&[("foo", Value::Int(1))]);

    let get = ns.call("_getattr_", args([d.clone(), Value::str("get")])).unwrap();
    assert_eq!(get.call(args([Value::str("foo")])).unwrap(), Value::Int(1));
    assert_eq!(ns.call("hasattr", args([d.clone(), Value::str("nope")])).unwrap(), Value::Bool(false));
    assert!(ns.call("_getattr_", args([d, Value::str("__class__")])).unwrap_err().is_denied());
}

#[test]
fn test_unknown_name() {
    let ns = namespace(RecordingAuthority::accepting());
    let err = ns.call("open", args([Value::str("/etc/passwd")])).unwrap_err();
    assert!(matches!(err.native(), Some(NativeError::Name(_))));
}

#[test]
fn test_sandbox_units_share_nothing_but_config() {
    let sandbox = Sandbox::new(GuardConfig::unaudited());
    let first = sandbox.context();
    let second = sandbox.context();
    assert_ne!(first.id(), second.id());

    let value = sandbox
        .run_unit(&first, Arc::new(PermissiveAuthority), |ctx, ns| {
            assert!(second.current().is_err());
            assert_eq!(ns.context().id(), ctx.id());
            ns.call("max", args([ints(&[4, 9, 2])]))
        })
        .unwrap();

    assert_eq!(value, Value::Int(9));
}
