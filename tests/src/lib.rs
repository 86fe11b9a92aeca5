#[cfg(test)]
mod test_full_ballot_flow;
#[cfg(test)]
mod test_concurrent_submission;
#[cfg(test)]
mod test_roll_file;
#[cfg(test)]
mod utils;
