//! Readers for the text files the modeling toolkit leaves in a project.

pub mod fasta;
pub mod seqid;
