pub mod survey;

pub use survey::{read_survey, read_survey_csv};
