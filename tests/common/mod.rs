use std::cell::Cell;
use std::rc::Rc;
use std::sync::Once;

static INIT: Once = Once::new();

/// Route the crate's `log` output through the test harness. Honors
/// `RUST_LOG`; defaults to trace so growth and placeholder transitions show
/// up with `--nocapture`.
#[allow(dead_code)]
pub fn init_test_logger() {
    INIT.call_once(|| {
        let _ = env_logger::builder()
            .filter_level(log::LevelFilter::Trace)
            .parse_default_env()
            .is_test(true)
            .try_init();
    });
}

/// Value that counts its drops into a shared cell.
#[allow(dead_code)]
#[derive(Debug)]
pub struct DropCounter {
    pub id: u32,
    drops: Rc<Cell<usize>>,
}

#[allow(dead_code)]
impl DropCounter {
    pub fn new(id: u32, drops: &Rc<Cell<usize>>) -> Self {
        Self {
            id,
            drops: Rc::clone(drops),
        }
    }
}

impl Clone for DropCounter {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            drops: Rc::clone(&self.drops),
        }
    }
}

impl Drop for DropCounter {
    fn drop(&mut self) {
        self.drops.set(self.drops.get() + 1);
    }
}
