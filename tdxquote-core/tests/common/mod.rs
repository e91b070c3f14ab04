//! Byte fixtures for vendor quote files, built in code.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

static TEST_COUNTER: AtomicU64 = AtomicU64::new(0);

/// A process-unique scratch directory, removed on drop.
pub struct ScratchDir(pub PathBuf);

impl ScratchDir {
    pub fn new(tag: &str) -> Self {
        let id = TEST_COUNTER.fetch_add(1, Ordering::SeqCst);
        let dir =
            std::env::temp_dir().join(format!("tdxquote_{tag}_{}_{id}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        Self(dir)
    }

    pub fn write(&self, name: &str, bytes: &[u8]) -> PathBuf {
        let path = self.0.join(name);
        std::fs::write(&path, bytes).unwrap();
        path
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.0);
    }
}

pub fn daily_record(date: u32, open: u32, high: u32, low: u32, close: u32, amount: f32, volume: u32) -> [u8; 32] {
    let mut rec = [0u8; 32];
    let words = [date, open, high, low, close];
    for (i, w) in words.iter().enumerate() {
        rec[i * 4..i * 4 + 4].copy_from_slice(&w.to_le_bytes());
    }
    rec[20..24].copy_from_slice(&amount.to_le_bytes());
    rec[24..28].copy_from_slice(&volume.to_le_bytes());
    rec[28..32].copy_from_slice(&close.to_le_bytes());
    rec
}

pub fn minute_record(packed_date: u16, minutes: u16, ohlc: [f32; 4], amount: f32, volume: u32) -> [u8; 32] {
    let mut rec = [0u8; 32];
    rec[0..2].copy_from_slice(&packed_date.to_le_bytes());
    rec[2..4].copy_from_slice(&minutes.to_le_bytes());
    for (i, p) in ohlc.iter().enumerate() {
        rec[4 + i * 4..8 + i * 4].copy_from_slice(&p.to_le_bytes());
    }
    rec[20..24].copy_from_slice(&amount.to_le_bytes());
    rec[24..28].copy_from_slice(&volume.to_le_bytes());
    rec
}

pub fn concat(records: &[[u8; 32]]) -> Vec<u8> {
    records.iter().flat_map(|r| r.iter().copied()).collect()
}

/// `n` consecutive calendar days of plausible daily records from 2020-01-02.
pub fn daily_file(n: usize) -> Vec<u8> {
    let start = chrono::NaiveDate::from_ymd_opt(2020, 1, 2).unwrap();
    let records: Vec<[u8; 32]> = (0..n)
        .map(|i| {
            let d = start + chrono::Duration::days(i as i64);
            let raw = d.format("%Y%m%d").to_string().parse::<u32>().unwrap();
            let open = 1000 + (i as u32 % 50);
            daily_record(raw, open, open + 20, open - 10, open + 5, 1.0e6, 10_000 + i as u32)
        })
        .collect();
    concat(&records)
}
