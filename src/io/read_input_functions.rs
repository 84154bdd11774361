use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

use parry3d_f64::na::{Point2, Point3, Vector3};
use text_io::try_read;

use crate::error::DfngenError;

/// Reads `name: value` pairs from a whitespace separated text file.
///
/// Every variable is searched from the start of the file, so variables may appear in
/// any order. Arrays are written as `{a,b,c}` and may contain spaces.
pub struct InputReader<R> {
    source: R,
}

impl InputReader<BufReader<File>> {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, DfngenError> {
        Ok(Self::new(BufReader::new(File::open(path)?)))
    }
}

impl<R: Read + Seek> InputReader<R> {
    pub fn new(source: R) -> Self {
        Self { source }
    }

    /// Next whitespace delimited word, empty at the end of the file.
    pub fn next_token(&mut self) -> Result<String, DfngenError> {
        let mut bytes = (&mut self.source).bytes().map_while(Result::ok);
        let token: String = try_read!("{}", bytes)?;
        Ok(token)
    }

    /// Searches for variable in file, moves the file pointer to the position after the word.
    ///
    /// # Returns
    ///
    /// False if the file does not contain the word
    pub fn search_var(&mut self, search: &str) -> Result<bool, DfngenError> {
        self.source.seek(SeekFrom::Start(0))?;

        loop {
            let word = self.next_token()?;

            if word == search {
                return Ok(true);
            } else if word.is_empty() {
                return Ok(false);
            }
        }
    }

    fn require_var(&mut self, search: &str) -> Result<(), DfngenError> {
        if self.search_var(search)? {
            Ok(())
        } else {
            Err(DfngenError::MissingVariable(var_name(search).to_string()))
        }
    }

    /// Reads the value following `search` into `var`.
    pub fn read_value<T: ReadFromText>(
        &mut self,
        search: &str,
        var: &mut T,
    ) -> Result<(), DfngenError> {
        self.require_var(search)?;
        *var = T::read_from_text(self, var_name(search))?;
        Ok(())
    }

    /// Reads the value following `search`, `None` if the file does not define it.
    pub fn read_optional<T: ReadFromText>(&mut self, search: &str) -> Result<Option<T>, DfngenError> {
        if !self.search_var(search)? {
            return Ok(None);
        }

        T::read_from_text(self, var_name(search)).map(Some)
    }

    /// Reads `n_elements` whitespace separated values following `search`.
    pub fn read_elements<T: ReadFromText>(
        &mut self,
        search: &str,
        n_elements: usize,
    ) -> Result<Vec<T>, DfngenError> {
        self.require_var(search)?;

        (0..n_elements)
            .map(|_| T::read_from_text(self, var_name(search)))
            .collect()
    }

    /// Reads `n_rows` arrays of `N` values, e.g. `{x,y,z} {x,y,z}`.
    pub fn read_rows<const N: usize>(
        &mut self,
        search: &str,
        n_rows: usize,
    ) -> Result<Vec<[f64; N]>, DfngenError> {
        self.require_var(search)?;
        self.read_next_rows(var_name(search), n_rows)
    }

    /// Reads the value at the current position. `name` is only used in errors.
    pub fn read_next<T: ReadFromText>(&mut self, name: &str) -> Result<T, DfngenError> {
        T::read_from_text(self, name)
    }

    /// Reads `n_rows` arrays of `N` values at the current position.
    pub fn read_next_rows<const N: usize>(
        &mut self,
        name: &str,
        n_rows: usize,
    ) -> Result<Vec<[f64; N]>, DfngenError> {
        (0..n_rows)
            .map(|_| {
                let row = Vec::<f64>::read_from_text(self, name)?;
                <[f64; N]>::try_from(row.as_slice()).map_err(|_| DfngenError::ArrayLength {
                    name: name.to_string(),
                    expected: N,
                    found: row.len(),
                })
            })
            .collect()
    }

    /// Reads `n_points` coordinates `{x,y,z}` at the current position.
    pub fn read_points(
        &mut self,
        name: &str,
        n_points: usize,
    ) -> Result<Vec<Point3<f64>>, DfngenError> {
        Ok(self
            .read_next_rows::<3>(name, n_points)?
            .into_iter()
            .map(Point3::from)
            .collect())
    }

    /// Text of an array, from the opening to the closing curly brace.
    fn array_text(&mut self, name: &str) -> Result<String, DfngenError> {
        let mut text = self.next_token()?;

        if !text.starts_with('{') {
            return Err(DfngenError::ParseValue {
                name: name.to_string(),
                value: text,
            });
        }

        while !text.contains('}') {
            let more = self.next_token()?;

            if more.is_empty() {
                return Err(DfngenError::ParseValue {
                    name: name.to_string(),
                    value: text,
                });
            }

            text.push_str(&more);
        }

        Ok(text)
    }
}

/// Seed based on the system clock
pub fn get_time_based_seed() -> Result<u64, DfngenError> {
    Ok(SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs())
}

/// Reads the vertices of a polygon domain boundary.
///
/// The file holds the number of vertices followed by one `x y` pair per vertex.
pub fn read_domain_vertices<R: Read + Seek>(
    reader: &mut InputReader<R>,
) -> Result<Vec<Point2<f64>>, DfngenError> {
    let name = "domain vertices";
    let n_vertices: usize = reader.read_next(name)?;

    (0..n_vertices)
        .map(|_| {
            let x = reader.read_next(name)?;
            let y = reader.read_next(name)?;
            Ok(Point2::new(x, y))
        })
        .collect()
}

/// Variable name without the trailing colon.
fn var_name(search: &str) -> &str {
    search.strip_suffix(':').unwrap_or(search)
}

fn parse_token<T: FromStr>(name: &str, token: &str) -> Result<T, DfngenError> {
    token.trim().parse::<T>().map_err(|_| DfngenError::ParseValue {
        name: name.to_string(),
        value: token.to_string(),
    })
}

fn parse_array<T: FromStr>(name: &str, text: &str) -> Result<Vec<T>, DfngenError> {
    text.trim_start_matches('{')
        .split('}')
        .next()
        .unwrap_or_default()
        .split(',')
        .filter(|s| !s.trim().is_empty())
        .map(|s| parse_token(name, s))
        .collect()
}

/// Values which can be read from an input file.
pub trait ReadFromText: Sized {
    fn read_from_text<R: Read + Seek>(
        reader: &mut InputReader<R>,
        name: &str,
    ) -> Result<Self, DfngenError>;
}

macro_rules! impl_read_from_text {
    ($($t:ty),*) => {
        $(
            impl ReadFromText for $t {
                fn read_from_text<R: Read + Seek>(
                    reader: &mut InputReader<R>,
                    name: &str,
                ) -> Result<Self, DfngenError> {
                    let token = reader.next_token()?;
                    parse_token(name, &token)
                }
            }

            impl ReadFromText for Vec<$t> {
                fn read_from_text<R: Read + Seek>(
                    reader: &mut InputReader<R>,
                    name: &str,
                ) -> Result<Self, DfngenError> {
                    let text = reader.array_text(name)?;
                    parse_array(name, &text)
                }
            }
        )*
    };
}

impl_read_from_text!(u8, u64, usize, f64);

impl ReadFromText for String {
    fn read_from_text<R: Read + Seek>(
        reader: &mut InputReader<R>,
        name: &str,
    ) -> Result<Self, DfngenError> {
        let token = reader.next_token()?;

        if token.is_empty() {
            return Err(DfngenError::ParseValue {
                name: name.to_string(),
                value: token,
            });
        }

        Ok(token)
    }
}

/// Booleans are written as 0 or 1.
impl ReadFromText for bool {
    fn read_from_text<R: Read + Seek>(
        reader: &mut InputReader<R>,
        name: &str,
    ) -> Result<Self, DfngenError> {
        let value = u8::read_from_text(reader, name)?;
        Ok(value != 0)
    }
}

impl ReadFromText for Vec<bool> {
    fn read_from_text<R: Read + Seek>(
        reader: &mut InputReader<R>,
        name: &str,
    ) -> Result<Self, DfngenError> {
        let values = Vec::<u8>::read_from_text(reader, name)?;
        Ok(values.into_iter().map(|v| v != 0).collect())
    }
}

impl ReadFromText for Vector3<f64> {
    fn read_from_text<R: Read + Seek>(
        reader: &mut InputReader<R>,
        name: &str,
    ) -> Result<Self, DfngenError> {
        let values = Vec::<f64>::read_from_text(reader, name)?;

        match values[..] {
            [x, y, z] => Ok(Vector3::new(x, y, z)),
            _ => Err(DfngenError::ArrayLength {
                name: name.to_string(),
                expected: 3,
                found: values.len(),
            }),
        }
    }
}

impl ReadFromText for [bool; 6] {
    fn read_from_text<R: Read + Seek>(
        reader: &mut InputReader<R>,
        name: &str,
    ) -> Result<Self, DfngenError> {
        let values = Vec::<bool>::read_from_text(reader, name)?;

        <[bool; 6]>::try_from(values.as_slice()).map_err(|_| DfngenError::ArrayLength {
            name: name.to_string(),
            expected: 6,
            found: values.len(),
        })
    }
}
