//! End-to-end scenarios run through the public embedding surface, seeded
//! from the language's own specification examples: arithmetic and
//! locals, short-circuit evaluation, array growth paired with a
//! script-level sort driven by a host comparison function, tuple
//! indexing, by-reference arguments, and nested `break` levels. Each
//! script reports its result through a host `trace` sink instead of
//! stdout, so the test can assert on exactly what the script observed.

use std::cell::RefCell;
use std::rc::Rc;

use sl_host::{host_fn1, host_fn2, Module};

fn module_with_trace() -> (Module, Rc<RefCell<Vec<String>>>) {
    let log = Rc::new(RefCell::new(Vec::new()));
    let sink = log.clone();
    let mut module = Module::new();
    module.add_external_function(host_fn1("trace", move |s: String| -> () {
        sink.borrow_mut().push(s);
    }));
    return (module, log);
}

#[test]
fn arithmetic_and_locals() {
    let (mut module, log) = module_with_trace();
    module.declare_public_function("function void main()");
    module.load_str("public function void main(){ number a = 3; number b = 4; trace(toString(a*a + b*b)); }").unwrap();
    module.call_public("main", vec![]).unwrap();
    assert_eq!(log.borrow().as_slice(), &["25".to_string()]);
}

#[test]
fn short_circuit_and_never_evaluates_its_right_operand() {
    let (mut module, log) = module_with_trace();
    module.declare_public_function("function void main()");
    module.load_str("public function void main(){ number x = 0; if (0 && (x=1)) {} trace(toString(x)); }").unwrap();
    module.call_public("main", vec![]).unwrap();
    assert_eq!(log.borrow().as_slice(), &["0".to_string()]);
}

#[test]
fn array_grow_and_sort_via_a_host_comparison_function() {
    let (mut module, log) = module_with_trace();
    module.add_external_function(host_fn2("greater", |a: f64, b: f64| -> f64 {
        if a > b {
            1.0
        } else {
            0.0
        }
    }));
    module.declare_public_function("function void main()");
    let source = "
        public function void main() {
            number[] arr;
            for (number i = 0; i < 4; i = i + 1) {
                arr[i] = i * i - 10;
            }
            for (number i = 0; i < 4; i = i + 1) {
                for (number j = 0; j < 3 - i; j = j + 1) {
                    if (greater(arr[j], arr[j + 1])) {
                        number tmp = arr[j];
                        arr[j] = arr[j + 1];
                        arr[j + 1] = tmp;
                    }
                }
            }
            string out = \"[\";
            for (number i = 0; i < 4; i = i + 1) {
                out = out .. toString(arr[i]);
                if (i < 3) { out = out .. \", \"; }
            }
            out = out .. \"]\";
            trace(out);
        }
    ";
    module.load_str(source).unwrap();
    module.call_public("main", vec![]).unwrap();
    assert_eq!(log.borrow().as_slice(), &["[-10, -9, -6, -1, 6]".to_string()]);
}

#[test]
fn tuple_indexing_and_return() {
    let (mut module, log) = module_with_trace();
    module.declare_public_function("function void main()");
    let source = "
        function [number,string] pair(){ return {7,\"hi\"}; }
        public function void main(){
            [number,string] p = pair();
            trace(toString(p[0]));
            trace(p[1]);
        }
    ";
    module.load_str(source).unwrap();
    module.call_public("main", vec![]).unwrap();
    assert_eq!(log.borrow().as_slice(), &["7".to_string(), "hi".to_string()]);
}

#[test]
fn by_reference_argument_mutates_the_caller_s_local() {
    let (mut module, log) = module_with_trace();
    module.declare_public_function("function void main()");
    let source = "
        function void inc(number& x){ x = x + 1; }
        public function void main(){
            number n = 41;
            inc(&n);
            trace(toString(n));
        }
    ";
    module.load_str(source).unwrap();
    module.call_public("main", vec![]).unwrap();
    assert_eq!(log.borrow().as_slice(), &["42".to_string()]);
}

#[test]
fn break_levels_unwind_exactly_the_requested_number_of_loops() {
    let (mut module, log) = module_with_trace();
    module.declare_public_function("function void main()");
    let source = "
        public function void main(){
            for (number i=0;i<3;++i){
                for (number j=0;j<3;++j){
                    if (j==2) break 2;
                    trace(toString(i*10+j));
                }
            }
        }
    ";
    module.load_str(source).unwrap();
    module.call_public("main", vec![]).unwrap();
    assert_eq!(log.borrow().as_slice(), &["0".to_string(), "1".to_string()]);
}
