//! Interval relations between points and ranges.

use super::Prelude;
use crate::callable::{NativeArgs, NativeFunction, NativeHandler};
use crate::environment::Environment;
use crate::range;
use crate::{EvalError, Value};

macro_rules! range_relation {
    ($name:ident, $relation:path) => {
        fn $name(args: &NativeArgs, _env: &mut Environment) -> Result<Value, EvalError> {
            Ok(Value::Bool($relation(args.required("a")?, args.required("b")?)?))
        }
    };
}

range_relation!(builtin_before, range::before);
range_relation!(builtin_after, range::after);
range_relation!(builtin_meets, range::meets);
range_relation!(builtin_met_by, range::met_by);
range_relation!(builtin_overlaps, range::overlaps);
range_relation!(builtin_overlaps_before, range::overlaps_before);
range_relation!(builtin_overlaps_after, range::overlaps_after);
range_relation!(builtin_finishes, range::finishes);
range_relation!(builtin_finished_by, range::finished_by);
range_relation!(builtin_starts, range::starts);
range_relation!(builtin_started_by, range::started_by);
range_relation!(builtin_includes, range::includes);
range_relation!(builtin_during, range::during);
range_relation!(builtin_coincides, range::coincides);

pub(super) fn install(prelude: &mut Prelude) {
    let relations: [(&str, NativeHandler); 14] = [
        ("before", builtin_before),
        ("after", builtin_after),
        ("meets", builtin_meets),
        ("met by", builtin_met_by),
        ("overlaps", builtin_overlaps),
        ("overlaps before", builtin_overlaps_before),
        ("overlaps after", builtin_overlaps_after),
        ("finishes", builtin_finishes),
        ("finished by", builtin_finished_by),
        ("starts", builtin_starts),
        ("started by", builtin_started_by),
        ("includes", builtin_includes),
        ("during", builtin_during),
        ("coincides", builtin_coincides),
    ];
    for (name, handler) in relations {
        prelude.bind(name, NativeFunction::new(handler).required(["a", "b"]));
    }
}
