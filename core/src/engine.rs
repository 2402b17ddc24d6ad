use crate::bind::Bind;
use crate::capture::CaptureBuffer;
use crate::cursor::Cursor;
use crate::deserialize::Parser;
use crate::error::{Error, ErrorKind};
use crate::mapper::Mappers;
use crate::registry::{Registry, TypeDescriptor, TypeHandle};
use crate::text_reader::Encoding;
use log::trace;
use std::io::{BufReader, Read};

/// The configuration for an [`Engine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// The size, in characters, of the fixed buffer used to capture strings and numbers. Longer text
    /// spills into a growable buffer. Must be greater than 255.
    pub capture_buffer_len: usize,

    /// The maximum number of types the engine will register. Must be greater than 255.
    pub type_cache_capacity: usize,

    /// Whether `//` and `/* */` comments are treated as whitespace.
    pub allow_comments: bool,

    /// The maximum nesting depth of arrays and objects.
    pub max_depth: usize,
}

impl EngineConfig {
    /// The default configuration, which accepts only standard JSON.
    pub const fn strict() -> Self {
        Self {
            capture_buffer_len: 256,
            type_cache_capacity: 256,
            allow_comments: false,
            max_depth: 128,
        }
    }

    /// A configuration which also accepts comments.
    pub const fn permissive() -> Self {
        Self {
            allow_comments: true,
            ..Self::strict()
        }
    }

    /// Checks that this configuration is usable.
    pub fn validate(&self) -> Result<(), Error> {
        if self.capture_buffer_len <= 255 {
            return Err(ErrorKind::InvalidConfig("capture buffer must be longer than 255").into());
        }
        if self.type_cache_capacity <= 255 {
            return Err(
                ErrorKind::InvalidConfig("type cache capacity must be greater than 255").into(),
            );
        }
        if self.max_depth == 0 {
            return Err(ErrorKind::InvalidConfig("max depth must be positive").into());
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::strict()
    }
}

/// Deserializes JSON into Rust types, caching the binding plan of every type it encounters.
///
/// An engine parses one input at a time; use one engine per thread.
pub struct Engine {
    config: EngineConfig,
    registry: Registry,
    buffer: CaptureBuffer,
}

impl Engine {
    /// Constructs an [`Engine`] with the default configuration.
    pub fn new() -> Self {
        match Self::with_config(EngineConfig::default()) {
            Ok(engine) => engine,
            Err(err) => unreachable!("default configuration rejected: {}", err),
        }
    }

    /// Constructs an [`Engine`] with the given configuration.
    pub fn with_config(config: EngineConfig) -> Result<Self, Error> {
        config.validate()?;
        Ok(Self {
            config,
            registry: Registry::new(config.type_cache_capacity)?,
            buffer: CaptureBuffer::new(config.capture_buffer_len),
        })
    }

    /// Gets the configuration of this engine.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Registers `T` (and every type reachable from it), returning its handle. Registering a
    /// record also makes its name available to type tags in untyped parses.
    pub fn register<T: Bind>(&mut self) -> Result<TypeHandle, Error> {
        self.registry.resolve::<T>()
    }

    /// Gets the handle for `T`, if it has been registered.
    pub fn handle_of<T: Bind>(&self) -> Option<TypeHandle> {
        self.registry.handle_of::<T>()
    }

    /// Gets the descriptor for the given handle.
    pub fn descriptor(&self, handle: TypeHandle) -> Option<&TypeDescriptor> {
        self.registry.descriptor(handle)
    }

    /// Gets the number of registered types.
    pub fn type_count(&self) -> usize {
        self.registry.len()
    }

    /// Parses a `T` from a string.
    pub fn parse<T: Bind>(&mut self, text: &str) -> Result<T, Error> {
        self.parse_text(text, None)
    }

    /// Parses a `T` from a string, consulting `mappers` for each member.
    pub fn parse_with<T: Bind>(&mut self, text: &str, mappers: &Mappers) -> Result<T, Error> {
        self.parse_text(text, Some(mappers))
    }

    /// Parses a `T` from a byte stream in the given encoding.
    pub fn parse_reader<T: Bind>(
        &mut self,
        reader: impl Read,
        encoding: Encoding,
    ) -> Result<T, Error> {
        self.parse_stream(reader, encoding, None)
    }

    /// Parses a `T` from a byte stream in the given encoding, consulting `mappers` for each
    /// member.
    pub fn parse_reader_with<T: Bind>(
        &mut self,
        reader: impl Read,
        encoding: Encoding,
        mappers: &Mappers,
    ) -> Result<T, Error> {
        self.parse_stream(reader, encoding, Some(mappers))
    }

    fn parse_text<T: Bind>(&mut self, text: &str, mappers: Option<&Mappers>) -> Result<T, Error> {
        trace!("parsing {} from text", std::any::type_name::<T>());
        self.registry.apply_mappers(mappers);
        let handle = self.registry.resolve::<T>()?;
        let cursor = Cursor::from_text(text, &mut self.buffer, self.config.allow_comments);
        run(&mut self.registry, cursor, self.config.max_depth, handle)
    }

    fn parse_stream<T: Bind>(
        &mut self,
        reader: impl Read,
        encoding: Encoding,
        mappers: Option<&Mappers>,
    ) -> Result<T, Error> {
        trace!("parsing {} from {:?} stream", std::any::type_name::<T>(), encoding);
        self.registry.apply_mappers(mappers);
        let handle = self.registry.resolve::<T>()?;
        let reader = encoding.reader(BufReader::new(reader));
        let cursor = Cursor::from_reader(reader, &mut self.buffer, self.config.allow_comments)?;
        run(&mut self.registry, cursor, self.config.max_depth, handle)
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

/// Parses a complete document as the type `handle`.
fn run<T: Bind>(
    registry: &mut Registry,
    cursor: Cursor<'_>,
    max_depth: usize,
    handle: TypeHandle,
) -> Result<T, Error> {
    let mut parser = Parser::new(registry, cursor, max_depth);
    let value = T::parse(&mut parser, handle)?;
    parser.finish()?;
    Ok(value)
}

#[test]
fn test_config_validation() {
    assert!(Engine::with_config(EngineConfig::strict()).is_ok());
    assert!(Engine::with_config(EngineConfig::permissive()).is_ok());
    for config in [
        EngineConfig {
            capture_buffer_len: 255,
            ..EngineConfig::strict()
        },
        EngineConfig {
            type_cache_capacity: 16,
            ..EngineConfig::strict()
        },
        EngineConfig {
            max_depth: 0,
            ..EngineConfig::strict()
        },
    ] {
        let err = Engine::with_config(config).err().unwrap();
        assert!(matches!(err.kind(), ErrorKind::InvalidConfig(_)));
        assert_eq!(err.position(), None);
    }
}

#[test]
fn test_builtin_handles() {
    let engine = Engine::new();
    assert_eq!(engine.type_count(), 3);
    assert_eq!(
        engine.handle_of::<crate::Value>(),
        Some(TypeHandle::UNTYPED)
    );
    assert_eq!(
        engine.handle_of::<Vec<crate::Value>>(),
        Some(TypeHandle::UNTYPED_LIST)
    );
    assert_eq!(engine.handle_of::<char>(), Some(TypeHandle::CHAR));
}
