//! Test fixtures for webserver tests

use shared::TaskId;

pub struct TestFixtures;

impl TestFixtures {
    pub const TASK_ID: &'static str = "550e8400-e29b-41d4-a716-446655440001";

    pub const REFERENCE_INPUT: &'static str =
        "Song,Date,Number of Plays\nA,20200101,3\nB,20200101,5\nA,20200101,2\nA,20200102,1\n";

    pub const REFERENCE_OUTPUT: &'static str = "entity,date,total\nA,20200101,5\nA,20200102,1\nB,20200101,5\n";

    pub const MALFORMED_INPUT: &'static str = "entity,date,count\nA,20200101,-4\n";

    pub fn task_id() -> TaskId {
        TaskId::from_string(Self::TASK_ID).unwrap()
    }
}
