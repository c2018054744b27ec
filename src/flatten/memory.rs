use sysinfo::System;

/// Source of the free-memory figure used to pick a flatten strategy
pub trait MemoryProbe: Send + Sync {
    fn free_bytes(&self) -> u64;
}

/// Reads available memory from the operating system, counting reclaimable
/// page cache as free
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemMemory;

impl MemoryProbe for SystemMemory {
    fn free_bytes(&self) -> u64 {
        let mut sys = System::new();
        sys.refresh_memory();
        sys.available_memory()
    }
}

/// Reports a constant amount of free memory
#[derive(Debug, Clone, Copy)]
pub struct FixedMemory(pub u64);

impl MemoryProbe for FixedMemory {
    fn free_bytes(&self) -> u64 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_memory() {
        assert_eq!(FixedMemory(123).free_bytes(), 123);
    }

    #[test]
    fn test_system_memory_reports_available_within_total() {
        let mut sys = System::new();
        sys.refresh_memory();
        let available = SystemMemory.free_bytes();
        assert!(available > 0);
        assert!(available <= sys.total_memory());
    }
}
