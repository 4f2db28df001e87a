pub mod compare;
pub mod decode;
pub mod display;
pub mod expected;
pub mod loader;
pub mod report;
pub mod wildcard;

pub use compare::{compare, Comparator, Diff, MatchTally, Outcome};
pub use decode::{to_pickle, DecodeHint, Decoder};
pub use expected::{
    Expected, ListOrder, MultiMatch, StructuredString, TypeCompareOverride, COMPARE_KEY,
};
pub use loader::{load_expected, load_value, parse_document, Format};
pub use report::MismatchReport;
pub use wildcard::{DontCare, WildcardOptions, WildcardRule};
