mod tables;

pub use self::tables::{
    comparison as print_comparison, key_descriptors as print_key_descriptors,
    key_vocabulary as print_key_vocabulary, layout as print_layout, metrics as print_metrics,
    snapshot_summary as print_snapshot_summary,
};
