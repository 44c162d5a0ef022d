//! Wire-level properties of command decoding and assembly.

use proptest::prelude::*;

use tako_protocol::command::SpriteUpdate;
use tako_protocol::{Command, CommandAssembler, CommandFlags, MAX_COMMAND_LEN};

proptest! {
    #[test]
    fn decode_never_panics(bytes in proptest::collection::vec(any::<u8>(), 0..64)) {
        let _ = Command::decode(&bytes);
    }

    #[test]
    fn assembler_never_panics(bytes in proptest::collection::vec(any::<u8>(), 0..4096)) {
        let mut asm = CommandAssembler::new();
        for b in bytes {
            if let Some(cmd) = asm.feed(b) {
                prop_assert!(cmd.bytes.len() <= MAX_COMMAND_LEN);
                prop_assert!(cmd.bytes.len() >= 2);
            }
        }
    }

    #[test]
    fn assembled_update_sprite_decodes(
        sprite in any::<u8>(),
        x in any::<u16>(),
        y in any::<u16>(),
        pattern in any::<u8>(),
        attr in any::<u8>(),
        ctrl in any::<u8>(),
    ) {
        let original = Command::UpdateSprite(SpriteUpdate { sprite, x, y, pattern, attr, ctrl });
        let mut buf = [0u8; 16];
        let len = original.encode(CommandFlags::NONE, &mut buf).unwrap();

        let mut asm = CommandAssembler::new();
        let mut completed = 0;
        for &b in &buf[..len] {
            if let Some(cmd) = asm.feed(b) {
                let (header, decoded) = Command::decode(cmd.bytes).unwrap();
                prop_assert_eq!(header.kind, 0x04);
                prop_assert_eq!(decoded, original.clone());
                completed += 1;
            }
        }
        prop_assert_eq!(completed, 1);
    }
}
