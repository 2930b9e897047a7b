//! A `trace(string)` sink that writes to stdout through the `log` facade,
//! the same ambient logging every other crate in the workspace reaches for.
//! A host embedding this stdlib swaps it out for its own sink by simply not
//! registering this one and registering `trace` itself instead, the same
//! way `lang/host/tests/scenarios.rs` captures traces into a buffer.

use sl_host::{host_fn1, Module};

pub fn register(module: &mut Module) {
    module.add_external_function(host_fn1("trace", |s: String| -> () {
        log::info!(target: "sl::trace", "{}", s);
        println!("{}", s);
    }));
}

#[cfg(test)]
mod test {
    use sl_host::Module;

    #[test]
    fn trace_is_callable_with_a_string_argument() {
        let mut module = Module::new();
        super::register(&mut module);
        module.declare_public_function("function void run()");
        module.load_str("public function void run() { trace(\"hi\"); }").unwrap();
        module.call_public("run", vec![]).unwrap();
    }
}
