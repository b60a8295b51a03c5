use std::collections::BTreeMap;

use apiary::def_op_func;
use apiary::dset::funcs::{FuncError, OpFunc};
use apiary::dset::script::{GraphPlan, PlanError};
use apiary::dset::transformations::{register_filter, register_flat_map, register_map};
use apiary::Context;
use lazy_static::lazy_static;
use parking_lot::Mutex;

def_op_func!(
    Ident(i: u64)[] -> u64 {
        i
    }
    Double(x: u64)[] -> u64 {
        x * 2
    }
    PlusN(x: u64)[n: u64] -> u64 {
        x + n
    }
    IsEven(x: u64)[] -> bool {
        x % 2 == 0
    }
    Sum(a: u64, b: u64)[] -> u64 {
        a + b
    }
    Repeat(x: u64)[times: usize] -> Vec<u64> {
        vec![x; times]
    }
    NeverRegistered(x: u64)[] -> u64 {
        x + 100
    }
);

lazy_static! {
    static ref INIT_LOCK: Mutex<bool> = Mutex::new(false);
}

fn prepare_transformers() {
    let mut inited = INIT_LOCK.lock();
    if *inited {
        return;
    }
    register_map::<Double, u64, u64>();
    register_map::<PlusN, u64, u64>();
    register_filter::<IsEven, u64>();
    register_flat_map::<Repeat, u64, u64>();
    *inited = true;
}

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn generate_map_filter_gather() {
    init();
    let ctx = Context::local();
    let nums = ctx.generate(10, Ident {}).unwrap();
    let shifted = nums.map(PlusN { n: 3 }).unwrap();
    let even = shifted.filter(IsEven {}).unwrap();

    let expected: Vec<u64> = (0u64..10).map(|i| i + 3).filter(|x| x % 2 == 0).collect();
    assert_eq!(even.gather().unwrap(), expected);
}

#[test]
fn reduce_combines_all_elements() {
    init();
    let ctx = Context::local();
    let nums = ctx.generate(5, Ident {}).unwrap();
    assert_eq!(nums.reduce(Sum {}).unwrap(), Some(10));
}

#[test]
fn reduce_of_empty_collection_is_none() {
    init();
    let ctx = Context::local();
    let empty = ctx.from_vec(Vec::<u64>::new()).unwrap();
    assert_eq!(empty.reduce(Sum {}).unwrap(), None);
}

#[test]
fn union_concatenates_left_first() {
    init();
    let ctx = Context::local();
    let left = ctx.from_vec(vec![1u64, 2]).unwrap();
    let right = ctx.from_vec(vec![3u64]).unwrap();
    let both = left.union(&right).unwrap();
    assert_eq!(both.gather().unwrap(), vec![1, 2, 3]);
}

#[test]
fn flat_map_expands_elements() {
    init();
    let ctx = Context::local();
    let nums = ctx.from_vec(vec![1u64, 2]).unwrap();
    let repeated = nums.flat_map(Repeat { times: 2 }).unwrap();
    assert_eq!(repeated.gather().unwrap(), vec![1, 1, 2, 2]);
}

#[test]
fn checkpoint_replays_from_snapshot() {
    init();
    let ctx = Context::local();
    let a = ctx.from_vec(vec![1u64, 2, 3]).unwrap();
    let b = a.map(Double {}).unwrap();
    b.materialize().unwrap();

    let cp = b.checkpoint().unwrap();
    let c = cp.map(PlusN { n: 1 }).unwrap();
    assert_eq!(c.gather().unwrap(), vec![3, 5, 7]);

    let dag = ctx.dag();
    assert_eq!(dag.get(cp.id()).unwrap().parents(), &[None]);
}

#[test]
fn gather_moves_bytes_through_the_cluster() {
    init();
    let ctx = Context::local();
    let nums = ctx.from_vec(vec![1u64, 2, 3]).unwrap();
    nums.gather().unwrap();
    let traffic = ctx.cluster().traffic();
    assert!(traffic.bytes_sent > 0);
    assert!(traffic.bytes_received > 0);
}

#[test]
fn verify_plan_passes_on_a_single_host() {
    init();
    let ctx = Context::local();
    let _ = ctx.from_vec(vec![1u64]).unwrap();
    ctx.verify_plan().unwrap();
}

#[test]
fn fingerprint_is_deterministic_across_replicas() {
    init();
    fn build(ctx: &Context) {
        let a = ctx.from_vec(vec![1u64, 2]).unwrap();
        let b = a.map(Double {}).unwrap();
        b.filter(IsEven {}).unwrap();
    }
    let ctx_a = Context::local();
    let ctx_b = Context::local();
    build(&ctx_a);
    build(&ctx_b);
    assert_eq!(ctx_a.fingerprint(), ctx_b.fingerprint());

    // a replica that wired one extra node must diverge
    let _ = ctx_b.from_vec(vec![9u64]).unwrap();
    assert_ne!(ctx_a.fingerprint(), ctx_b.fingerprint());
}

#[test]
fn plan_compiles_through_the_registry() {
    init();
    prepare_transformers();

    let mut plan = GraphPlan::new();
    let input = plan.input();
    let mapped = plan.map(input, &Double {}).unwrap();
    let filtered = plan.filter(mapped, &IsEven {}).unwrap();
    let repeated = plan.flat_map(filtered, &Repeat { times: 2 }).unwrap();

    // over the wire and back
    let bytes = plan.encode().unwrap();
    let plan = GraphPlan::decode(&bytes).unwrap();

    let ctx = Context::local();
    let src = ctx.from_vec(vec![1u64, 2, 3]).unwrap();
    let mut bindings = BTreeMap::new();
    bindings.insert(input, src.id());
    let built = plan.compile(&ctx, &bindings).unwrap();

    let out = built[&repeated];
    ctx.materialize(out).unwrap();
    assert_eq!(
        ctx.collect_result::<u64>(out).unwrap(),
        vec![2, 2, 4, 4, 6, 6]
    );
}

#[test]
fn plan_with_unregistered_func_fails_to_compile() {
    init();
    let mut plan = GraphPlan::new();
    let input = plan.input();
    plan.map(input, &NeverRegistered {}).unwrap();

    let ctx = Context::local();
    let src = ctx.from_vec(vec![1u64]).unwrap();
    let mut bindings = BTreeMap::new();
    bindings.insert(input, src.id());
    let err = plan.compile(&ctx, &bindings).unwrap_err();
    match err {
        PlanError::Func(FuncError::NotRegistered(id)) => {
            assert_eq!(id, NeverRegistered::id());
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn plan_with_unknown_dep_is_rejected_at_build_time() {
    init();
    let mut plan = GraphPlan::new();
    let err = plan.map(7, &Double {}).unwrap_err();
    assert!(matches!(err, PlanError::UnknownDep { dep: 7, .. }));
}
