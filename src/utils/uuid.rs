use itertools::Itertools;
use std::fmt;
use uuid::Uuid;

#[derive(Ord, PartialOrd, PartialEq, Eq, Hash, Copy, Clone, Serialize, Deserialize)]
pub struct UUID {
    bytes: [u8; 16],
}

impl UUID {
    pub fn rand() -> UUID {
        let uuid = Uuid::new_v4();
        UUID {
            bytes: *uuid.as_bytes(),
        }
    }
}

impl fmt::Display for UUID {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:02x}", self.bytes.iter().format(""))
    }
}

impl fmt::Debug for UUID {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "UUID({})", self)
    }
}
