//! Math host functions: thin wrappers over `f64`'s own methods, each
//! registered through `host_fn1`/`host_fn2` the same way any other embedder
//! would register its own domain functions.

use sl_host::{host_fn1, host_fn2, Module};

pub fn register(module: &mut Module) {
    module.add_external_function(host_fn1("sqrt", |n: f64| n.sqrt()));
    module.add_external_function(host_fn1("abs", |n: f64| n.abs()));
    module.add_external_function(host_fn1("floor", |n: f64| n.floor()));
    module.add_external_function(host_fn1("ceil", |n: f64| n.ceil()));
    module.add_external_function(host_fn1("sin", |n: f64| n.sin()));
    module.add_external_function(host_fn1("cos", |n: f64| n.cos()));
    module.add_external_function(host_fn2("pow", |base: f64, exp: f64| base.powf(exp)));
    module.add_external_function(host_fn2("min", |a: f64, b: f64| a.min(b)));
    module.add_external_function(host_fn2("max", |a: f64, b: f64| a.max(b)));
}

#[cfg(test)]
mod test {
    use sl_host::Module;

    #[test]
    fn sqrt_is_callable_from_a_loaded_script() {
        let mut module = Module::new();
        super::register(&mut module);
        module.declare_public_function("function number run()");
        module.load_str("public function number run() { return sqrt(16); }").unwrap();
        let result = module.call_public("run", vec![]).unwrap();
        assert_eq!(result.borrow().as_number(), 4.0);
    }

    #[test]
    fn pow_raises_to_the_given_exponent() {
        let mut module = Module::new();
        super::register(&mut module);
        module.declare_public_function("function number run()");
        module.load_str("public function number run() { return pow(2, 10); }").unwrap();
        let result = module.call_public("run", vec![]).unwrap();
        assert_eq!(result.borrow().as_number(), 1024.0);
    }
}
