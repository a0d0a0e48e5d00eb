use std::collections::HashSet;

/// Batch-local output names: a repeated `name.ext` becomes `name_1.ext`, `name_2.ext`, ...
#[derive(Debug, Default)]
pub struct FilenameAllocator {
    used: HashSet<String>,
}

impl FilenameAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allocate(&mut self, filename: &str) -> String {
        let (stem, ext) = match filename.rfind('.') {
            Some(idx) if idx > 0 => filename.split_at(idx),
            _ => (filename, ""),
        };
        let mut candidate = filename.to_string();
        let mut counter = 1u32;
        while self.used.contains(&candidate) {
            candidate = format!("{}_{}{}", stem, counter, ext);
            counter += 1;
        }
        self.used.insert(candidate.clone());
        candidate
    }
}
