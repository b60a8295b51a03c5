use apiary::def_op_func;
use apiary::dset::funcs::{OpFunc, REGISTRY};
use lazy_static::lazy_static;
use parking_lot::Mutex;

def_op_func!(
    APlusB(a: u64, b: u64)[] -> u64 {
        a + b
    }
    AMultB(a: u32, b: u32)[] -> u32 {
        a * b
    }
    AMultC(a: u32)[c: u32] -> u32 {
        a * c
    }
);

lazy_static! {
    static ref INIT_LOCK: Mutex<bool> = Mutex::new(false);
}

fn prepare_registry() {
    let mut inited = INIT_LOCK.lock();
    if *inited {
        return;
    }
    APlusB::register();
    AMultB::register();
    AMultC::register();
    *inited = true;
}

#[test]
fn direct_calls() {
    assert_eq!(
        APlusB::call(Box::new(APlusB {}), Box::new((1u64, 2u64)))
            .cast::<u64>()
            .unwrap(),
        3
    );
    assert_eq!(
        AMultB::call(Box::new(AMultB {}), Box::new((2u32, 3u32)))
            .cast::<u32>()
            .unwrap(),
        6
    );
    assert_eq!(
        AMultC::call(Box::new(AMultC { c: 5 }), Box::new((2u32,)))
            .cast::<u32>()
            .unwrap(),
        10
    );
}

#[test]
fn call_through_registry() {
    prepare_registry();
    let reg_a = REGISTRY.get(APlusB::id()).unwrap();
    let reg_b = REGISTRY.get(AMultB::id()).unwrap();
    let reg_c = REGISTRY.get(AMultC::id()).unwrap();

    let a: u64 = reg_a.call(Box::new(APlusB {}), (1u64, 2u64)).unwrap();
    let b: u32 = reg_b.call(Box::new(AMultB {}), (2u32, 3u32)).unwrap();
    let c: u32 = reg_c.call(Box::new(AMultC { c: 5 }), (2u32,)).unwrap();
    assert_eq!(a, 3);
    assert_eq!(b, 6);
    assert_eq!(c, 10);
}

#[test]
fn wrong_argument_types_are_refused() {
    let res = APlusB::call(Box::new(APlusB {}), Box::new((1u32, 2u32)));
    assert!(res.cast::<u64>().is_err());
}

#[test]
fn decode_from_registry() {
    prepare_registry();
    let original = AMultC { c: 5 };
    let bytes = original.encode().unwrap();

    let reg_c = REGISTRY.get(AMultC::id()).unwrap();
    let decoded = reg_c.decode(&bytes).unwrap();
    assert_eq!(decoded.downcast_ref::<AMultC>(), Some(&original));

    let result: u32 = reg_c.call(decoded, (2u32,)).unwrap();
    assert_eq!(result, 10);
}

#[test]
fn encode_decode_round_trip() {
    let original = AMultC { c: 7 };
    let bytes = original.encode().unwrap();
    let decoded = AMultC::decode(&bytes).unwrap();
    assert_eq!(decoded, original);
}

#[test]
fn ids_are_stable_and_distinct() {
    assert_eq!(APlusB::id(), APlusB::id());
    assert_ne!(APlusB::id(), AMultB::id());
    assert_ne!(AMultB::id(), AMultC::id());
}

#[test]
fn unknown_id_is_not_found() {
    prepare_registry();
    assert!(REGISTRY.get(0xdead_beef_dead_beef).is_none());
}
