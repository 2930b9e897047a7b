//! String host functions. `host_fn`'s scalar `HostValue` impls only cover
//! `f64`/`String`/`()`, which matches what these need: SL arrays and tuples
//! never cross the host boundary (spec §4.10), so anything indexed or
//! structured stays script-side and these only ever see whole strings and
//! numbers.

use sl_host::{host_fn1, host_fn2, Module};

pub fn register(module: &mut Module) {
    module.add_external_function(host_fn1("length", |s: String| s.chars().count() as f64));
    module.add_external_function(host_fn1("upper", |s: String| s.to_uppercase()));
    module.add_external_function(host_fn1("lower", |s: String| s.to_lowercase()));
    module.add_external_function(host_fn2("concat", |a: String, b: String| a + &b));
    module.add_external_function(host_fn1("trim", |s: String| s.trim().to_string()));
}

#[cfg(test)]
mod test {
    use sl_host::Module;

    #[test]
    fn length_counts_characters() {
        let mut module = Module::new();
        super::register(&mut module);
        module.declare_public_function("function number run()");
        module.load_str("public function number run() { return length(\"hello\"); }").unwrap();
        let result = module.call_public("run", vec![]).unwrap();
        assert_eq!(result.borrow().as_number(), 5.0);
    }

    #[test]
    fn upper_uppercases_the_whole_string() {
        let mut module = Module::new();
        super::register(&mut module);
        module.declare_public_function("function string run()");
        module.load_str("public function string run() { return upper(\"hi\"); }").unwrap();
        let result = module.call_public("run", vec![]).unwrap();
        assert_eq!(result.borrow().as_string().as_ref(), "HI");
    }
}
