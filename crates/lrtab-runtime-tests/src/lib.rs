//! End-to-end tests driving `lrtab-runtime` with tables generated by `lrtab`.

pub mod lexer;

#[cfg(test)]
mod g_calc;
#[cfg(test)]
mod g_recovery;
