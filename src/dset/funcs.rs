use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::any::Any;
use std::collections::HashMap;

// Operator functions are compiled into the application; the only way to
// recover one at runtime from an id is to have its monomorphized entry
// points registered up front. Nodes and plans therefore carry function ids
// only, and registration is manual: a macro cannot emit the registry call
// somewhere it would actually run.

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FuncError {
    NotRegistered(u64),
    Codec(String),
}

pub enum FuncResult {
    Ok(Box<dyn Any>),
    Err(String),
}

impl FuncResult {
    pub fn cast<T: Clone + 'static>(&self) -> Result<T, String> {
        match self {
            FuncResult::Ok(data) => match data.downcast_ref::<T>() {
                Some(res) => Ok(res.clone()),
                None => Err("op func result type mismatch".to_string()),
            },
            FuncResult::Err(e) => Err(format!("op func result is error: {}", e)),
        }
    }
}

pub type CallFn = fn(Box<dyn Any>, Box<dyn Any>) -> FuncResult;
pub type DecodeFn = fn(&[u8]) -> Result<Box<dyn Any>, FuncError>;

#[derive(Clone, Copy)]
pub struct RegistryOpFunc {
    pub id: u64,
    func: CallFn,
    decoder: DecodeFn,
}

impl RegistryOpFunc {
    pub fn call<A, R>(&self, closure: Box<dyn Any>, args: A) -> Result<R, String>
    where
        A: Any,
        R: Any + Clone,
    {
        (self.func)(closure, Box::new(args)).cast()
    }

    pub fn decode(&self, bytes: &[u8]) -> Result<Box<dyn Any>, FuncError> {
        (self.decoder)(bytes)
    }
}

pub struct Registry {
    map: RwLock<HashMap<u64, RegistryOpFunc>>,
}

impl Registry {
    fn new() -> Registry {
        Registry {
            map: RwLock::new(HashMap::new()),
        }
    }

    /// Re-registering an id overwrites; the id is a path hash, so a
    /// collision can only be the same function again.
    pub fn register(&self, id: u64, func: CallFn, decoder: DecodeFn) {
        let mut m = self.map.write();
        m.insert(id, RegistryOpFunc { id, func, decoder });
    }

    pub fn get(&self, id: u64) -> Option<RegistryOpFunc> {
        self.map.read().get(&id).copied()
    }
}

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();
}

/// A serializable operator function: a struct of captured state plus an
/// `apply` over a typed argument tuple. Declared with `def_op_func!`,
/// identified by a stable hash of its item path, shipped as bincode bytes.
pub trait OpFunc: Serialize + DeserializeOwned + Send + Sync + Sized + 'static {
    type In: Send + 'static;
    type Out: Send + 'static;

    fn apply(&self, args: Self::In) -> Self::Out;
    fn id() -> u64;

    fn call(closure: Box<dyn Any>, args: Box<dyn Any>) -> FuncResult {
        let closure = match closure.downcast_ref::<Self>() {
            Some(closure) => closure,
            None => return FuncResult::Err("closure is not for this op func".to_string()),
        };
        match args.downcast::<Self::In>() {
            Ok(args) => FuncResult::Ok(Box::new(closure.apply(*args))),
            Err(_) => FuncResult::Err("cannot cast op func arguments".to_string()),
        }
    }

    fn encode(&self) -> Result<Vec<u8>, FuncError> {
        bincode::serialize(self).map_err(|e| FuncError::Codec(e.to_string()))
    }

    fn decode(bytes: &[u8]) -> Result<Self, FuncError> {
        bincode::deserialize(bytes).map_err(|e| FuncError::Codec(e.to_string()))
    }

    fn decode_boxed(bytes: &[u8]) -> Result<Box<dyn Any>, FuncError> {
        Ok(Box::new(Self::decode(bytes)?))
    }

    fn register() {
        REGISTRY.register(Self::id(), Self::call, Self::decode_boxed)
    }
}
