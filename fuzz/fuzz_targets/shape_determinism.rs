#![no_main]

use libfuzzer_sys::fuzz_target;
use zip_tree::model::ShapeInput;

fuzz_target!(|input: ShapeInput| {
    zip_tree::model::run_shape_determinism(input);
});
