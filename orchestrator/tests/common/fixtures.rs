//! Test fixtures and data for orchestrator tests

/// Standard test data and fixtures
pub struct TestFixtures;

impl TestFixtures {
    /// Header names are ignored, only the column position matters
    pub const REFERENCE_INPUT: &'static str =
        "Song,Date,Number of Plays\nA,20200101,3\nB,20200101,5\nA,20200101,2\nA,20200102,1\n";

    pub const REFERENCE_OUTPUT: &'static str = "entity,date,total\nA,20200101,5\nA,20200102,1\nB,20200101,5\n";

    /// Row 3 (line 3 of the file) has a non-numeric count
    pub const MALFORMED_INPUT: &'static str = "entity,date,count\nA,20200101,3\nB,20200101,lots\nA,20200102,1\n";

    pub const HEADER_ONLY_INPUT: &'static str = "entity,date,count\n";

    pub const EMPTY_OUTPUT: &'static str = "entity,date,total\n";

    pub const DEFAULT_WORKERS: usize = 2;
    pub const DEFAULT_BATCH_SIZE: usize = 2;

    /// Input where every row belongs to `entity` on one date
    pub fn single_key_input(entity: &str, rows: u64) -> String {
        let mut input = String::from("entity,date,count\n");
        for i in 1..=rows {
            input.push_str(&format!("{entity},2020-01-01,{i}\n"));
        }
        input
    }

    /// Expected output for `single_key_input`
    pub fn single_key_output(entity: &str, rows: u64) -> String {
        format!("entity,date,total\n{entity},2020-01-01,{}\n", rows * (rows + 1) / 2)
    }
}
