//! In-memory PCF8563 register file used by the driver tests.

use embedded_hal::i2c::{ErrorKind, ErrorType, I2c, NoAcknowledgeSource, Operation};

/// Answers on one address and auto-increments the register pointer like the
/// real chip does.
pub(crate) struct FakePcf8563 {
    pub(crate) registers: [u8; 16],
    pub(crate) writes: usize,
    address: u8,
}

impl FakePcf8563 {
    pub(crate) fn new(address: u8) -> Self {
        Self {
            registers: [0; 16],
            writes: 0,
            address,
        }
    }
}

impl ErrorType for FakePcf8563 {
    type Error = ErrorKind;
}

impl I2c for FakePcf8563 {
    fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        if address != self.address {
            return Err(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address));
        }
        let mut pointer: Option<usize> = None;
        for operation in operations.iter_mut() {
            match operation {
                Operation::Write(bytes) => {
                    let (first, rest) = bytes.split_first().ok_or(ErrorKind::Other)?;
                    let mut reg = usize::from(*first);
                    for byte in rest {
                        self.registers[reg % 16] = *byte;
                        self.writes += 1;
                        reg += 1;
                    }
                    pointer = Some(reg);
                }
                Operation::Read(buffer) => {
                    let mut reg = pointer.ok_or(ErrorKind::Other)?;
                    for byte in buffer.iter_mut() {
                        *byte = self.registers[reg % 16];
                        reg += 1;
                    }
                    pointer = Some(reg);
                }
            }
        }
        Ok(())
    }
}
