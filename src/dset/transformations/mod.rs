use parking_lot::RwLock;
use std::collections::BTreeMap;

use super::funcs::{FuncError, OpFunc};
use super::node::UnaryFn;
use super::script::OpCode;

pub mod filter;
pub mod flat_map;
pub mod map;
pub mod union;

pub type NodeCtorFn = fn(&[u8]) -> Result<UnaryFn, FuncError>;

/// Constructors for rebuilding transformation nodes out of transported
/// plans. Registration is manual and monomorphized: a plan can only be
/// compiled where its operator functions were registered for the element
/// types it was built with.
pub struct TransformerRegistry {
    map: RwLock<BTreeMap<(OpCode, u64), NodeCtorFn>>,
}

impl TransformerRegistry {
    fn new() -> TransformerRegistry {
        TransformerRegistry {
            map: RwLock::new(BTreeMap::new()),
        }
    }

    pub fn register(&self, op: OpCode, func_id: u64, constructor: NodeCtorFn) {
        let mut reg = self.map.write();
        reg.insert((op, func_id), constructor);
    }

    pub fn get(&self, op: OpCode, func_id: u64) -> Option<NodeCtorFn> {
        self.map.read().get(&(op, func_id)).copied()
    }
}

lazy_static! {
    pub static ref TRANSFORMERS: TransformerRegistry = TransformerRegistry::new();
}

pub fn register_map<F, I, O>()
where
    F: OpFunc<In = (I,), Out = O>,
    I: Clone + Send + Sync + 'static,
    O: Send + Sync + 'static,
{
    fn ctor<F, I, O>(bytes: &[u8]) -> Result<UnaryFn, FuncError>
    where
        F: OpFunc<In = (I,), Out = O>,
        I: Clone + Send + Sync + 'static,
        O: Send + Sync + 'static,
    {
        Ok(map::map_fn(F::decode(bytes)?))
    }
    TRANSFORMERS.register(OpCode::Map, F::id(), ctor::<F, I, O>);
}

pub fn register_filter<F, I>()
where
    F: OpFunc<In = (I,), Out = bool>,
    I: Clone + Send + Sync + 'static,
{
    fn ctor<F, I>(bytes: &[u8]) -> Result<UnaryFn, FuncError>
    where
        F: OpFunc<In = (I,), Out = bool>,
        I: Clone + Send + Sync + 'static,
    {
        Ok(filter::filter_fn(F::decode(bytes)?))
    }
    TRANSFORMERS.register(OpCode::Filter, F::id(), ctor::<F, I>);
}

pub fn register_flat_map<F, I, O>()
where
    F: OpFunc<In = (I,)>,
    F::Out: IntoIterator<Item = O>,
    I: Clone + Send + Sync + 'static,
    O: Send + Sync + 'static,
{
    fn ctor<F, I, O>(bytes: &[u8]) -> Result<UnaryFn, FuncError>
    where
        F: OpFunc<In = (I,)>,
        F::Out: IntoIterator<Item = O>,
        I: Clone + Send + Sync + 'static,
        O: Send + Sync + 'static,
    {
        Ok(flat_map::flat_map_fn(F::decode(bytes)?))
    }
    TRANSFORMERS.register(OpCode::FlatMap, F::id(), ctor::<F, I, O>);
}
