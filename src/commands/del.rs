use crate::commands::executable::Executable;
use crate::commands::wrong_number_of_arguments;
use crate::frame::Frame;
use crate::store::InnerStoreLocked;

// https://redis.io/commands/del
#[derive(Clone, Debug, PartialEq)]
pub struct Del {
    pub keys: Vec<String>,
}

impl Executable for Del {
    fn exec(self, store: &mut InnerStoreLocked<'_>) -> Frame {
        if self.keys.is_empty() {
            return wrong_number_of_arguments("del");
        }

        let mut count = 0;
        for key in self.keys {
            if store.remove(&key).is_some() {
                count += 1;
            }
        }
        Frame::Integer(count)
    }
}

impl Del {
    pub fn to_cmd(&self) -> redis::Cmd {
        let mut cmd = redis::cmd("DEL");
        cmd.arg(&self.keys);
        cmd
    }
}
