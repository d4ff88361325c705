//! Flat RAM bus for unit tests.

use std::sync::{Arc, OnceLock};

use crate::{Bus, Dsp, ins::OpcodeTable};

pub struct FlatBus {
    pub data: Vec<u16>,
    pub prog: Vec<u16>,
}

impl FlatBus {
    pub fn new() -> Self {
        Self {
            data: vec![0; 0x1_0000],
            prog: vec![0; 0x4_0000],
        }
    }
}

impl Bus for FlatBus {
    fn data_read(&mut self, address: u16) -> u16 {
        self.data[address as usize]
    }

    fn data_write(&mut self, address: u16, value: u16) {
        self.data[address as usize] = value;
    }

    fn program_read(&mut self, address: u32) -> u16 {
        self.prog[address as usize & 0x3FFFF]
    }

    fn program_write(&mut self, address: u32, value: u16) {
        self.prog[address as usize & 0x3FFFF] = value;
    }
}

fn shared_table() -> Arc<OpcodeTable> {
    static TABLE: OnceLock<Arc<OpcodeTable>> = OnceLock::new();
    TABLE.get_or_init(|| Arc::new(OpcodeTable::new())).clone()
}

pub fn flat() -> Dsp<FlatBus> {
    Dsp::with_table(FlatBus::new(), shared_table())
}
